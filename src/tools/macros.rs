//! Tool Definition Macros
//!
//! Cuts the boilerplate out of metadata and argument handling

/// Define tool metadata using a declarative syntax
///
/// # Example
/// ```
/// use hcp_scorecard::tool_metadata;
///
/// let metadata = tool_metadata! {
///     name: "get_close_rate",
///     description: "Close rate of estimates over a trailing period",
///     parameters: [
///         {
///             name: "days_back",
///             type: "integer",
///             description: "Days to look back (default 30)",
///             required: false
///         }
///     ]
/// };
/// assert_eq!(metadata.parameters.len(), 1);
/// ```
#[macro_export]
macro_rules! tool_metadata {
    (
        name: $name:expr,
        description: $description:expr,
        parameters: [
            $(
                {
                    name: $param_name:expr,
                    type: $param_type:expr,
                    description: $param_desc:expr,
                    required: $param_required:expr
                }
            ),* $(,)?
        ]
    ) => {
        $crate::tools::ToolMetadata {
            name: $name.to_string(),
            description: $description.to_string(),
            parameters: vec![
                $(
                    $crate::tools::ToolParameter {
                        name: $param_name.to_string(),
                        param_type: $param_type.to_string(),
                        description: $param_desc.to_string(),
                        required: $param_required,
                    }
                ),*
            ],
        }
    };
}

/// Required string parameter, or an early `Err` from the enclosing function
#[macro_export]
macro_rules! validate_required_string {
    ($args:expr, $param:expr) => {
        $args[$param].as_str().ok_or_else(|| {
            anyhow::anyhow!("'{}' parameter is required and must be a string", $param)
        })?
    };
}

/// Optional string parameter; empty strings count as absent
#[macro_export]
macro_rules! optional_string {
    ($args:expr, $param:expr) => {
        $args[$param].as_str().filter(|s| !s.trim().is_empty())
    };
}
