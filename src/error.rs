use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CfgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Bind(#[from] BindError),

    #[error("Failed to read config file `{path}`")]
    #[diagnostic(
        code(io::read_failed),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
#[error("Parser Error")]
pub enum ParserError {
    #[error("Unexpected token")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Unexpected end of file")]
    #[diagnostic(
        code(parser::unexpected_eof),
        help("The file ended unexpectedly. The parser expected more tokens.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("File ended unexpectedly here")]
        span: SourceSpan,
    },

    #[error("Unclosed node `{name}`")]
    #[diagnostic(
        code(parser::unclosed_node),
        help("Every `{{` opening a node needs a matching `}}`.")
    )]
    UnclosedNode {
        #[source_code]
        src: NamedSource<String>,
        #[label("This node is never closed")]
        span: SourceSpan,
        name: String,
    },

    #[error("Unmatched closing brace")]
    #[diagnostic(
        code(parser::unmatched_brace),
        help("This `}}` does not close any node.")
    )]
    UnmatchedBrace {
        #[source_code]
        src: NamedSource<String>,
        #[label("No node to close here")]
        span: SourceSpan,
    },
}

/// Errors raised while binding object fields to a [`ConfigNode`](crate::node::ConfigNode).
///
/// Everything except [`BindError::Conversion`] and errors returned by
/// [`NodeObject::load`](crate::types::NodeObject::load) signals a mismatch between a type
/// declaration and the way it is used, not bad input.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum BindError {
    #[error("Cannot bind list field `{field}` on `{owner}`: the field holds no list")]
    #[diagnostic(
        code(bind::null_collection),
        help("Initialise the field with an empty collection before binding it.")
    )]
    NullCollection { field: String, owner: String },

    #[error(
        "A default constructor is required for the node type `{type_name}` (needed to parse field `{field}` on `{owner}`)"
    )]
    #[diagnostic(
        code(bind::missing_constructor),
        help("Declare the type with `TypeInfo::node` (requires `Default`) or as a component.")
    )]
    MissingConstructor {
        type_name: String,
        field: String,
        owner: String,
    },

    #[error("`{operation}` is not supported for `{type_name}`: {reason}")]
    #[diagnostic(code(bind::unsupported_operation))]
    UnsupportedOperation {
        operation: &'static str,
        type_name: String,
        reason: &'static str,
    },

    #[error("Cannot parse `{value}` as `{type_name}`: {message}")]
    #[diagnostic(code(bind::conversion))]
    Conversion {
        type_name: String,
        value: String,
        message: String,
    },

    #[error("Value `{value}` of field `{field}` cannot be written as config text: {reason}")]
    #[diagnostic(
        code(bind::unrepresentable_value),
        help("Config values are single-line, contain no braces or `//`, and have no surrounding whitespace.")
    )]
    UnrepresentableValue {
        field: String,
        value: String,
        reason: &'static str,
    },

    #[error("Value assigned to field `{field}` is not a `{expected}`")]
    #[diagnostic(code(bind::type_mismatch))]
    TypeMismatch { field: String, expected: String },

    #[error("No converter is registered for `{type_name}`")]
    #[diagnostic(
        code(bind::unregistered_type),
        help("Register the type with `ParseRegistry::register`.")
    )]
    UnregisteredType { type_name: String },

    #[error("Component `{type_name}` cannot be created without a parent container")]
    #[diagnostic(
        code(bind::missing_container),
        help("Return the owning container from `ConfigHost::container`.")
    )]
    MissingContainer { type_name: String },

    #[error("The factory does not know how to create `{type_name}`")]
    #[diagnostic(
        code(bind::unknown_component),
        help("Register the component with `ComponentFactory::register_component`.")
    )]
    UnknownComponent { type_name: String },

    #[error("{message}")]
    #[diagnostic(code(bind::custom))]
    Custom { message: String },

    #[error("Error in field `{field}`")]
    #[diagnostic(code(bind::field))]
    Field {
        field: String,
        #[source]
        source: Box<BindError>,
    },
}

impl BindError {
    /// Shorthand for errors raised by hand-written `NodeObject::load` impls.
    pub fn custom(message: impl Into<String>) -> Self {
        BindError::Custom {
            message: message.into(),
        }
    }

    /// Wraps `self` with the name of the field that produced it.
    pub(crate) fn in_field(self, field: &str) -> Self {
        BindError::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// Strips any [`BindError::Field`] wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &BindError {
        match self {
            BindError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
