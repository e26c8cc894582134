use tide::StatusCode;

/// SQLITE_CONSTRAINT, the primary result code shared by every extended
/// constraint code (CHECK, FOREIGNKEY, NOTNULL, ...)
const SQLITE_CONSTRAINT: i32 = 19;

/**
 * Everything that can go wrong while serving polls
 */
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Question not found")]
    NotFound,

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Year out of range: {0}")]
    InvalidYear(i32),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Failed to apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Template directory not found: {0:?}")]
    TemplateDir(std::path::PathBuf),

    #[error("Failed to load templates: {0}")]
    Template(#[from] handlebars::TemplateFileError),

    #[error("Failed to render page: {0}")]
    Render(#[from] handlebars::RenderError),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound,
            sqlx::Error::Database(db) if is_constraint_violation(&*db) => {
                Error::Integrity(db.message().to_string())
            }
            other => Error::Database(other),
        }
    }
}

fn is_constraint_violation(err: &dyn sqlx::error::DatabaseError) -> bool {
    let by_code = err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| code & 0xff == SQLITE_CONSTRAINT)
        .unwrap_or(false);

    by_code || err.message().contains("constraint failed")
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NotFound,
            Error::Integrity(_) | Error::InvalidYear(_) => StatusCode::BadRequest,
            _ => StatusCode::InternalServerError,
        }
    }

    /**
     * Convert into a tide::Error carrying the matching status code
     *
     * tide's blanket `From` would turn everything into a 500
     */
    pub fn into_tide(self) -> tide::Error {
        let status = self.status();
        if status == StatusCode::InternalServerError {
            log::error!("{}", self);
        }
        tide::Error::from_str(status, self.to_string())
    }
}
