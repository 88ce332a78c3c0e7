use crate::source_location::SourceLocation;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    UnresolvedType,
    MalformedInput,
    InvalidSizingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A field refers to a type, or a package, that the input does not define.
    #[error("{}", unresolved_message(.token, .is_package))]
    UnresolvedType {
        token: String,
        is_package: bool,
        location: SourceLocation,
    },

    #[error("failed to parse input: {}{}", .message, location_suffix(.location))]
    MalformedInput {
        message: String,
        location: Option<SourceLocation>,
    },

    #[error("invalid sizing config: {0}")]
    InvalidSizingConfig(String),
}

fn unresolved_message(token: &str, is_package: &bool) -> String {
    if *is_package {
        format!("type from [{token}] package is undefined. Check your imports or provide the type definition as well.")
    } else {
        format!("type [{token}] is undefined. Provide the type definition as well.")
    }
}

fn location_suffix(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!(" (at {loc})"),
        None => String::new(),
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnresolvedType { .. } => ErrorKind::UnresolvedType,
            Error::MalformedInput { .. } => ErrorKind::MalformedInput,
            Error::InvalidSizingConfig(_) => ErrorKind::InvalidSizingConfig,
        }
    }

    pub fn unresolved_package(package: &str, location: SourceLocation) -> Error {
        Error::UnresolvedType {
            token: package.to_string(),
            is_package: true,
            location,
        }
    }

    pub fn unresolved_identifier(name: &str, location: SourceLocation) -> Error {
        Error::UnresolvedType {
            token: name.to_string(),
            is_package: false,
            location,
        }
    }

    pub fn malformed(message: impl Into<String>, location: Option<SourceLocation>) -> Error {
        Error::MalformedInput {
            message: message.into(),
            location,
        }
    }
}
