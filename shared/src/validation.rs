pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 5;
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_OPTION_LENGTH: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("Title exceeds maximum length of {MAX_TITLE_LENGTH}")]
    TitleTooLong,
    #[error("Too few options (minimum {MIN_OPTIONS})")]
    TooFewOptions,
    #[error("Too many options (maximum {MAX_OPTIONS})")]
    TooManyOptions,
    #[error("Empty option text")]
    EmptyOption,
    #[error("Option text exceeds maximum length of {MAX_OPTION_LENGTH}")]
    OptionTooLong,
}

impl ValidationError {
    /// True for the two variants that violate the 2-to-5 option bound.
    pub fn is_option_count(&self) -> bool {
        matches!(self, ValidationError::TooFewOptions | ValidationError::TooManyOptions)
    }
}

pub fn validate_poll_input(title: &str, options: &[String]) -> Result<(), ValidationError> {
    if title.trim().is_empty() { return Err(ValidationError::EmptyTitle); }
    if title.len() > MAX_TITLE_LENGTH { return Err(ValidationError::TitleTooLong); }
    if options.len() < MIN_OPTIONS { return Err(ValidationError::TooFewOptions); }
    if options.len() > MAX_OPTIONS { return Err(ValidationError::TooManyOptions); }
    if options.iter().any(|opt| opt.trim().is_empty()) { return Err(ValidationError::EmptyOption); }
    if options.iter().any(|opt| opt.len() > MAX_OPTION_LENGTH) { return Err(ValidationError::OptionTooLong); }

    Ok(())
}
