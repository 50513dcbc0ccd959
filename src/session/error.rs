/// User-presentable session failures, one variant per class the UI
/// distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Caught client-side before any request is sent.
    #[error("{0}")]
    Validation(String),
    /// 401 from the token endpoint, translated to a fixed message.
    #[error("Invalid username or password. Please try again.")]
    InvalidCredentials,
    /// The backend rejected the request with a detail string (field
    /// validation errors arrive pre-joined into a multi-line string).
    #[error("{0}")]
    Rejected(String),
    /// Request was sent but no response came back.
    #[error("No response from server. Please check your internet connection.")]
    Network,
    #[error("{0}")]
    Unexpected(String),
}

impl SessionError {
    /// Joins structured field errors (`loc`/`msg` pairs) into the display
    /// string the forms render.
    pub fn from_field_errors<'a, I>(errors: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let joined = errors
            .into_iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>()
            .join("\n");
        Self::Rejected(joined)
    }
}
