use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Choice, Question};

/**
 * Context for the index page
 */
#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub latest_question_list: Vec<Question>,
}

/**
 * Context for the detail page: the question plus its choices for the form
 */
#[derive(Debug, Serialize)]
pub struct DetailPage {
    pub question: Question,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Serialize)]
pub struct ResultsPage {
    pub question: Question,
}

/**
 * The form posted from the detail page
 */
#[derive(Debug, Default, Deserialize)]
pub struct VoteForm {
    /**
     * Id of the selected choice, absent when nothing was picked
     */
    pub choice: Option<i64>,
}

/**
 * Admin-provided details to create a Question
 */
#[derive(Debug, Deserialize)]
pub struct InsertableQuestion {
    pub question_text: String,
    /**
     * Publish immediately when left out
     */
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    /**
     * Just the text of each choice, they all start with zero votes
     */
    #[serde(default)]
    pub choices: Vec<String>,
}

/**
 * A freshly created question along with its choices
 */
#[derive(Debug, Serialize)]
pub struct CreatedQuestion {
    pub question: Question,
    pub choices: Vec<Choice>,
}
