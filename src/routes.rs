use serde::Serialize;
use tide::http::mime;
use tide::{Request, Response, StatusCode};

use crate::error::Error;
use crate::AppState;

/**
 * Render the named template into an HTML response
 */
fn render<T: Serialize>(state: &AppState, template: &str, context: &T) -> Result<Response, tide::Error> {
    let html = state
        .templates
        .render(template, context)
        .map_err(|e| Error::from(e).into_tide())?;

    Ok(Response::builder(StatusCode::Ok)
        .body(html)
        .content_type(mime::HTML)
        .build())
}

/**
 * The `:question_id` parameter, anything that isn't an integer can't name a question
 */
fn question_id(req: &Request<AppState>) -> Result<i64, tide::Error> {
    req.param::<i64>("question_id")
        .map_err(|_| Error::NotFound.into_tide())
}

pub mod polls {
    use chrono::Utc;
    use log::*;
    use tide::{Body, Request, Response, StatusCode};

    use super::{question_id, render};
    use crate::api_models::{DetailPage, IndexPage, ResultsPage, VoteForm};
    use crate::error::Error;
    use crate::models::Question;
    use crate::AppState;

    /**
     *  GET /polls
     */
    pub async fn index(req: Request<AppState>) -> Result<Response, tide::Error> {
        let latest_question_list = Question::latest(&req.state().db, Utc::now())
            .await
            .map_err(Error::into_tide)?;

        render(req.state(), "index", &IndexPage { latest_question_list })
    }

    /**
     *  GET /polls/:question_id
     */
    pub async fn detail(req: Request<AppState>) -> Result<Response, tide::Error> {
        let id = question_id(&req)?;
        let db = &req.state().db;

        let question = Question::get_published(db, id, Utc::now())
            .await
            .map_err(Error::into_tide)?;
        let choices = question.choices(db).await.map_err(Error::into_tide)?;

        render(req.state(), "detail", &DetailPage { question, choices })
    }

    /**
     *  GET /polls/:question_id/results
     */
    pub async fn results(req: Request<AppState>) -> Result<Response, tide::Error> {
        let id = question_id(&req)?;
        let question = Question::get_published(&req.state().db, id, Utc::now())
            .await
            .map_err(Error::into_tide)?;

        render(req.state(), "results", &ResultsPage { question })
    }

    /**
     *  POST /polls/:question_id/vote
     *
     *  Nothing is recorded, the ballot is only acknowledged
     */
    pub async fn vote(mut req: Request<AppState>) -> Result<Body, tide::Error> {
        let id = question_id(&req)?;
        let body = req.body_string().await?;

        let form: VoteForm = serde_qs::from_str(&body).map_err(|e| {
            tide::Error::from_str(StatusCode::BadRequest, format!("Invalid ballot: {}", e))
        })?;
        debug!("Ballot received for question {}: {:?}", id, form);

        Ok(Body::from_string(format!("You're voting on question {}.", id)))
    }
}

pub mod admin {
    use chrono::Utc;
    use log::*;
    use tide::{Body, Request, Response, StatusCode};

    use super::question_id;
    use crate::api_models::{CreatedQuestion, InsertableQuestion};
    use crate::error::Error;
    use crate::models::{Choice, Question};
    use crate::AppState;

    /**
     *  PUT /admin/questions
     *
     *  The question and its choices land together or not at all
     */
    pub async fn create(mut req: Request<AppState>) -> Result<Response, tide::Error> {
        let insertable: InsertableQuestion = req.body_json().await?;
        debug!("Question received: {:?}", insertable);

        let pub_date = insertable.pub_date.unwrap_or_else(Utc::now);
        let mut tx = req
            .state()
            .db
            .begin()
            .await
            .map_err(|e| Error::from(e).into_tide())?;

        let question = Question::create(&mut tx, &insertable.question_text, pub_date)
            .await
            .map_err(Error::into_tide)?;

        let mut choices = Vec::with_capacity(insertable.choices.len());
        for text in insertable.choices.iter() {
            let choice = Choice::create(&mut tx, question.id, text, 0)
                .await
                .map_err(Error::into_tide)?;
            choices.push(choice);
        }

        tx.commit().await.map_err(|e| Error::from(e).into_tide())?;
        info!("Created question {} with {} choices", question.id, choices.len());

        let response = Response::builder(StatusCode::Created)
            .body(Body::from_json(&CreatedQuestion { question, choices })?)
            .build();
        Ok(response)
    }

    /**
     *  DELETE /admin/questions/:question_id
     */
    pub async fn delete(req: Request<AppState>) -> Result<Response, tide::Error> {
        let id = question_id(&req)?;
        Question::delete(&req.state().db, id)
            .await
            .map_err(Error::into_tide)?;

        Ok(Response::new(StatusCode::NoContent))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tide::http::{Method, Url};
    use tide::StatusCode;

    use crate::models::{Choice, Question};
    use crate::test_state;

    async fn send(app: &tide::Server<crate::AppState>, method: Method, path: &str, body: Option<&str>) -> (StatusCode, String) {
        let url = Url::parse(&format!("http://localhost{}", path)).unwrap();
        let mut req = tide::http::Request::new(method, url);
        if let Some(body) = body {
            req.set_body(body);
        }
        let mut res: tide::http::Response = app.respond(req).await.unwrap();
        let status = res.status();
        (status, res.body_string().await.unwrap())
    }

    async fn get(app: &tide::Server<crate::AppState>, path: &str) -> (StatusCode, String) {
        send(app, Method::Get, path, None).await
    }

    async fn create_question(state: &crate::AppState, text: &str, days: i64) -> Question {
        Question::create(&state.db, text, Utc::now() + Duration::days(days))
            .await
            .unwrap()
    }

    #[async_std::test]
    async fn test_no_questions() {
        let app = crate::app(test_state().await);
        let (status, body) = get(&app, "/polls").await;
        assert_eq!(status, StatusCode::Ok);
        assert!(body.contains("No polls are available."));
    }

    #[async_std::test]
    async fn test_past_question() {
        let state = test_state().await;
        create_question(&state, "Past question.", -30).await;
        let app = crate::app(state);

        let (status, body) = get(&app, "/polls").await;
        assert_eq!(status, StatusCode::Ok);
        assert!(body.contains("Past question."));
        assert!(!body.contains("No polls are available."));
    }

    #[async_std::test]
    async fn test_future_question() {
        let state = test_state().await;
        create_question(&state, "Future question.", 30).await;
        let app = crate::app(state);

        let (_, body) = get(&app, "/polls").await;
        assert!(body.contains("No polls are available."));
        assert!(!body.contains("Future question."));
    }

    #[async_std::test]
    async fn test_future_question_and_past_question() {
        let state = test_state().await;
        create_question(&state, "Past question.", -30).await;
        create_question(&state, "Future question.", 30).await;
        let app = crate::app(state);

        let (_, body) = get(&app, "/polls").await;
        assert!(body.contains("Past question."));
        assert!(!body.contains("Future question."));
    }

    #[async_std::test]
    async fn test_two_past_questions_in_publish_order() {
        let state = test_state().await;
        create_question(&state, "Past question 2.", -5).await;
        create_question(&state, "Past question 1.", -30).await;
        let app = crate::app(state);

        let (_, body) = get(&app, "/polls").await;
        let first = body.find("Past question 1.").unwrap();
        let second = body.find("Past question 2.").unwrap();
        assert!(first < second);
    }

    #[async_std::test]
    async fn test_index_lists_at_most_five() {
        let state = test_state().await;
        for day in 1..=6 {
            create_question(&state, &format!("Question from day {}.", day), -(10 - day)).await;
        }
        let app = crate::app(state);

        let (_, body) = get(&app, "/polls").await;
        assert_eq!(body.matches("<li>").count(), 5);
        assert!(!body.contains("Question from day 6."));
    }

    #[async_std::test]
    async fn test_root_redirects_to_index() {
        let app = crate::app(test_state().await);
        let (status, _) = get(&app, "/").await;
        assert_eq!(status, StatusCode::Found);
    }

    #[async_std::test]
    async fn test_detail_future_question() {
        let state = test_state().await;
        let future = create_question(&state, "Future question.", 5).await;
        let app = crate::app(state);

        let (status, _) = get(&app, &format!("/polls/{}", future.id)).await;
        assert_eq!(status, StatusCode::NotFound);
    }

    #[async_std::test]
    async fn test_detail_past_question() {
        let state = test_state().await;
        let past = create_question(&state, "Past Question.", -5).await;
        Choice::create(&state.db, past.id, "Not much", 0).await.unwrap();
        let app = crate::app(state);

        let (status, body) = get(&app, &format!("/polls/{}", past.id)).await;
        assert_eq!(status, StatusCode::Ok);
        assert!(body.contains("Past Question."));
        assert!(body.contains("Not much"));
    }

    #[async_std::test]
    async fn test_detail_missing_question() {
        let app = crate::app(test_state().await);
        assert_eq!(get(&app, "/polls/404").await.0, StatusCode::NotFound);
        assert_eq!(get(&app, "/polls/not-a-number").await.0, StatusCode::NotFound);
    }

    #[async_std::test]
    async fn test_results_missing_question() {
        let app = crate::app(test_state().await);
        assert_eq!(get(&app, "/polls/404/results").await.0, StatusCode::NotFound);
        assert_eq!(get(&app, "/polls/not-a-number/results").await.0, StatusCode::NotFound);
    }

    #[async_std::test]
    async fn test_results_future_question() {
        let state = test_state().await;
        let future = create_question(&state, "Future question.", 5).await;
        let app = crate::app(state);

        let (status, _) = get(&app, &format!("/polls/{}/results", future.id)).await;
        assert_eq!(status, StatusCode::NotFound);
    }

    #[async_std::test]
    async fn test_results_past_question() {
        let state = test_state().await;
        let past = create_question(&state, "Past Question.", -5).await;
        let app = crate::app(state);

        let (status, body) = get(&app, &format!("/polls/{}/results", past.id)).await;
        assert_eq!(status, StatusCode::Ok);
        assert!(body.contains("Past Question."));
        assert!(body.contains(&format!("You're looking at the results of question {}.", past.id)));
    }

    #[async_std::test]
    async fn test_vote_changes_nothing() {
        let state = test_state().await;
        let past = create_question(&state, "Past Question.", -5).await;
        let choice = Choice::create(&state.db, past.id, "Not much", 0).await.unwrap();
        let db = state.db.clone();
        let app = crate::app(state);

        let (status, body) = send(
            &app,
            Method::Post,
            &format!("/polls/{}/vote", past.id),
            Some(&format!("choice={}", choice.id)),
        )
        .await;
        assert_eq!(status, StatusCode::Ok);
        assert_eq!(body, format!("You're voting on question {}.", past.id));

        let choices = past.choices(&db).await.unwrap();
        assert_eq!(choices[0].votes, 0);
    }

    #[async_std::test]
    async fn test_admin_create_and_delete() {
        let state = test_state().await;
        let db = state.db.clone();
        let app = crate::app(state);

        let (status, body) = send(
            &app,
            Method::Put,
            "/admin/questions",
            Some(r#"{"question_text": "Tabs or spaces?", "choices": ["Tabs", "Spaces"]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::Created);

        let created: serde_json::Value = serde_json::from_str(&body).unwrap();
        let id = created["question"]["id"].as_i64().unwrap();
        assert_eq!(created["choices"].as_array().unwrap().len(), 2);

        let question = Question::get(&db, id).await.unwrap();
        assert_eq!(question.choices(&db).await.unwrap().len(), 2);

        let (status, _) = send(&app, Method::Delete, &format!("/admin/questions/{}", id), None).await;
        assert_eq!(status, StatusCode::NoContent);
        assert!(Question::get(&db, id).await.is_err());

        let (status, _) = send(&app, Method::Delete, &format!("/admin/questions/{}", id), None).await;
        assert_eq!(status, StatusCode::NotFound);
    }

    #[async_std::test]
    async fn test_admin_create_rolls_back_on_integrity_error() {
        let state = test_state().await;
        let db = state.db.clone();
        let app = crate::app(state);

        let too_long = "x".repeat(201);
        let payload = serde_json::json!({
            "question_text": "Will this stick?",
            "choices": ["Fine", too_long],
        });
        let (status, _) = send(&app, Method::Put, "/admin/questions", Some(&payload.to_string())).await;
        assert_eq!(status, StatusCode::BadRequest);

        assert!(Question::latest(&db, Utc::now()).await.unwrap().is_empty());
    }
}
