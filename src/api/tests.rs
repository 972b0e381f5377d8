use axum::http::{Method, StatusCode};
use serde_json::json;
use time::Duration;
use tower::ServiceExt;

use crate::core::time::primitive_now_utc;
use crate::db::types::{AccountStatus, UserRole};
use crate::test_support;

#[tokio::test]
async fn signup_login_and_me_roundtrip() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "alice@example.com",
                "full_name": "Alice Rahman",
                "password": "alice-pass-1"
            })),
        ))
        .await
        .expect("signup");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "student");
    let token = body["access_token"].as_str().expect("token").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");

    let status = response.status();
    let me = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {me}");
    assert_eq!(me["email"], "alice@example.com");

    // Duplicate signup is rejected regardless of email casing.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": "ALICE@example.com",
                "full_name": "Alice Again",
                "password": "alice-pass-2"
            })),
        ))
        .await
        .expect("duplicate signup");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn suspended_account_cannot_login_or_use_token() {
    let ctx = test_support::setup_test_context().await;

    let user = test_support::insert_user_with_status(
        ctx.state.db(),
        "suspended@example.com",
        "Suspended User",
        UserRole::Student,
        "suspended-pass",
        AccountStatus::Suspended,
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "suspended@example.com", "password": "suspended-pass"})),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A token minted before the suspension is also refused.
    let token = test_support::bearer_token(&user.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn assigning_twice_skips_duplicates_and_revoke_deactivates() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "teacher@example.com",
        "Teacher",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let now = primitive_now_utc();
    let exam =
        test_support::insert_exam(ctx.state.db(), "Midterm", &teacher.id, now + Duration::hours(1), None)
            .await;
    let second_exam =
        test_support::insert_exam(ctx.state.db(), "Retake", &teacher.id, now + Duration::hours(2), None)
            .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/assignments",
            Some(&token),
            Some(json!({
                "student_email": "student1@example.com",
                "exam_ids": [exam.id.clone(), second_exam.id.clone()]
            })),
        ))
        .await
        .expect("assign");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["assigned"].as_array().expect("assigned").len(), 2);
    assert_eq!(body["skipped"].as_array().expect("skipped").len(), 0);
    let assignment_id =
        body["assigned"][0]["id"].as_str().expect("assignment id").to_string();

    // A second run with one overlapping exam and one unknown exam only
    // reports skips.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/assignments",
            Some(&token),
            Some(json!({
                "student_email": "student1@example.com",
                "exam_ids": [exam.id.clone(), "missing-exam".to_string()]
            })),
        ))
        .await
        .expect("assign again");

    let body = test_support::read_json(response).await;
    assert_eq!(body["assigned"].as_array().expect("assigned").len(), 0);
    assert_eq!(body["skipped"], json!([exam.id, "missing-exam"]));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/assignments/revoke",
            Some(&token),
            Some(json!({"assignment_ids": [assignment_id.clone()]})),
        ))
        .await
        .expect("revoke");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["revoked"], json!([assignment_id.clone()]));

    // Revoking the same ids again matches nothing.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/assignments/revoke",
            Some(&token),
            Some(json!({"assignment_ids": [assignment_id]})),
        ))
        .await
        .expect("revoke again");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn student_exam_flow_start_save_submit() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "teacher@example.com",
        "Teacher",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student@example.com",
        "Student",
        UserRole::Student,
        "student-pass",
    )
    .await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let now = primitive_now_utc();
    let exam = test_support::insert_exam(
        ctx.state.db(),
        "Final Exam",
        &teacher.id,
        now - Duration::hours(1),
        Some(now + Duration::hours(2)),
    )
    .await;
    test_support::insert_assignment(
        ctx.state.db(),
        &exam.id,
        "student@example.com",
        Some(&student.id),
        &teacher.id,
    )
    .await;

    // Assigned exam shows up as pending before any session exists.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/student/exams", Some(&token), None))
        .await
        .expect("list exams");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().expect("exams").len(), 1);
    assert_eq!(body[0]["status"], "pending");
    assert!(body[0]["session_id"].is_null());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/start", exam.id),
            Some(&token),
            None,
        ))
        .await
        .expect("start");

    let status = response.status();
    let started = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {started}");
    assert_eq!(started["success"], true);
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();

    // A second start reports the existing session instead of creating one.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/start", exam.id),
            Some(&token),
            None,
        ))
        .await
        .expect("start again");

    let status = response.status();
    let repeated = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {repeated}");
    assert_eq!(repeated["success"], false);
    assert_eq!(repeated["session"]["id"], session_id.as_str());

    // Saving twice keeps a single row and replaces the whole map.
    for answers in [json!({"q1": "A"}), json!({"q1": "B", "q2": "C"})] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/student/exams/{}/save", exam.id),
                Some(&token),
                Some(json!({"session_id": session_id.clone(), "answers": answers})),
            ))
            .await
            .expect("save");
        let status = response.status();
        let saved = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {saved}");
        assert_eq!(saved["saved"], true);
    }

    let row_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM student_responses WHERE exam_session_id = $1",
    )
    .bind(&session_id)
    .fetch_one(ctx.state.db())
    .await
    .expect("count responses");
    assert_eq!(row_count, 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/submit", exam.id),
            Some(&token),
            None,
        ))
        .await
        .expect("submit");

    let status = response.status();
    let submitted = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {submitted}");
    assert_eq!(submitted["session"]["status"], "completed");
    assert_eq!(submitted["grading_status"], "graded");

    // Saving after completion is rejected.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/save", exam.id),
            Some(&token),
            Some(json!({"session_id": session_id.clone(), "answers": {"q1": "A"}})),
        ))
        .await
        .expect("save after submit");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // An unknown session id is a 404 rather than a silent insert.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/save", exam.id),
            Some(&token),
            Some(json!({"session_id": "missing-session", "answers": {"q1": "A"}})),
        ))
        .await
        .expect("save with bad session");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The completed session appears in results and in the list as completed.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/student/results", Some(&token), None))
        .await
        .expect("results");
    let results = test_support::read_json(response).await;
    assert_eq!(results.as_array().expect("results").len(), 1);
    assert_eq!(results[0]["exam_title"], "Final Exam");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/student/exams", Some(&token), None))
        .await
        .expect("list exams");
    let body = test_support::read_json(response).await;
    assert_eq!(body[0]["status"], "completed");
}

#[tokio::test]
async fn start_outside_window_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "teacher@example.com",
        "Teacher",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student@example.com",
        "Student",
        UserRole::Student,
        "student-pass",
    )
    .await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let now = primitive_now_utc();
    let upcoming = test_support::insert_exam(
        ctx.state.db(),
        "Upcoming Exam",
        &teacher.id,
        now + Duration::hours(1),
        Some(now + Duration::hours(3)),
    )
    .await;
    let elapsed = test_support::insert_exam(
        ctx.state.db(),
        "Elapsed Exam",
        &teacher.id,
        now - Duration::hours(3),
        Some(now - Duration::hours(1)),
    )
    .await;
    for exam_id in [&upcoming.id, &elapsed.id] {
        test_support::insert_assignment(
            ctx.state.db(),
            exam_id,
            "student@example.com",
            Some(&student.id),
            &teacher.id,
        )
        .await;
    }

    // Before the window opens.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/start", upcoming.id),
            Some(&token),
            None,
        ))
        .await
        .expect("start upcoming");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // After the window has closed.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/start", elapsed.id),
            Some(&token),
            None,
        ))
        .await
        .expect("start elapsed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Neither attempt left a session behind.
    let sessions: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM exam_sessions WHERE student_id = $1")
            .bind(&student.id)
            .fetch_one(ctx.state.db())
            .await
            .expect("count sessions");
    assert_eq!(sessions, 0);
}

#[tokio::test]
async fn save_rejects_another_students_session() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "teacher@example.com",
        "Teacher",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let owner = test_support::insert_user(
        ctx.state.db(),
        "owner@example.com",
        "Owner",
        UserRole::Student,
        "owner-pass",
    )
    .await;
    let intruder = test_support::insert_user(
        ctx.state.db(),
        "intruder@example.com",
        "Intruder",
        UserRole::Student,
        "intruder-pass",
    )
    .await;
    let owner_token = test_support::bearer_token(&owner.id, ctx.state.settings());
    let intruder_token = test_support::bearer_token(&intruder.id, ctx.state.settings());

    let now = primitive_now_utc();
    let exam = test_support::insert_exam(
        ctx.state.db(),
        "Shared Exam",
        &teacher.id,
        now - Duration::hours(1),
        Some(now + Duration::hours(2)),
    )
    .await;
    for student in [&owner, &intruder] {
        test_support::insert_assignment(
            ctx.state.db(),
            &exam.id,
            &student.email,
            Some(&student.id),
            &teacher.id,
        )
        .await;
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/start", exam.id),
            Some(&owner_token),
            None,
        ))
        .await
        .expect("start");
    let started = test_support::read_json(response).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/save", exam.id),
            Some(&intruder_token),
            Some(json!({"session_id": session_id, "answers": {"q1": "A"}})),
        ))
        .await
        .expect("save with foreign session");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn submit_grades_only_mcq_questions() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "teacher@example.com",
        "Teacher",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student@example.com",
        "Student",
        UserRole::Student,
        "student-pass",
    )
    .await;
    let teacher_token = test_support::bearer_token(&teacher.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let now = primitive_now_utc();
    let exam = test_support::insert_exam(
        ctx.state.db(),
        "Mixed Exam",
        &teacher.id,
        now - Duration::hours(1),
        Some(now + Duration::hours(2)),
    )
    .await;
    test_support::insert_assignment(
        ctx.state.db(),
        &exam.id,
        "student@example.com",
        Some(&student.id),
        &teacher.id,
    )
    .await;

    let mut question_ids = Vec::new();
    for payload in [
        json!({
            "kind": "mcq",
            "prompt": "2 + 2 = ?",
            "options": ["3", "4"],
            "correct_answer": "4",
            "points": 2.0,
            "position": 1
        }),
        json!({
            "kind": "saq",
            "prompt": "Name the process plants use to make food.",
            "options": [],
            "correct_answer": "photosynthesis",
            "points": 5.0,
            "position": 2
        }),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/exams/{}/questions", exam.id),
                Some(&teacher_token),
                Some(payload),
            ))
            .await
            .expect("create question");
        let question = test_support::read_json(response).await;
        question_ids.push(question["id"].as_str().expect("question id").to_string());
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/start", exam.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("start");
    let started = test_support::read_json(response).await;
    let session_id = started["session"]["id"].as_str().expect("session id").to_string();

    // Answer both "correctly"; only the MCQ can contribute to the score.
    let mcq_id = question_ids[0].clone();
    let saq_id = question_ids[1].clone();
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/save", exam.id),
            Some(&student_token),
            Some(json!({
                "session_id": session_id,
                "answers": {mcq_id: "4", saq_id: "photosynthesis"}
            })),
        ))
        .await
        .expect("save");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/submit", exam.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("submit");
    let submitted = test_support::read_json(response).await;
    assert_eq!(submitted["grading_status"], "graded");
    assert_eq!(submitted["total_score"], 2.0);
}

#[tokio::test]
async fn unassigned_student_cannot_start_exam() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "teacher@example.com",
        "Teacher",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student@example.com",
        "Student",
        UserRole::Student,
        "student-pass",
    )
    .await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let now = primitive_now_utc();
    let exam = test_support::insert_exam(
        ctx.state.db(),
        "Closed Exam",
        &teacher.id,
        now - Duration::hours(1),
        None,
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/student/exams/{}/start", exam.id),
            Some(&token),
            None,
        ))
        .await
        .expect("start");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invitation_accept_creates_account_and_links_assignments() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "teacher@example.com",
        "Teacher",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;

    let now = primitive_now_utc();
    let exam =
        test_support::insert_exam(ctx.state.db(), "Entrance Exam", &teacher.id, now + Duration::hours(1), None)
            .await;
    let other_exam =
        test_support::insert_exam(ctx.state.db(), "Other Exam", &teacher.id, now + Duration::hours(2), None)
            .await;

    // An assignment addressed to the email before registration.
    test_support::insert_assignment(
        ctx.state.db(),
        &other_exam.id,
        "invitee@example.com",
        None,
        &teacher.id,
    )
    .await;

    sqlx::query("INSERT INTO institutions (id, name, created_at, updated_at) VALUES ($1, $2, $3, $3)")
        .bind("inst-1")
        .bind("Example University")
        .bind(now)
        .execute(ctx.state.db())
        .await
        .expect("insert institution");
    sqlx::query(
        "INSERT INTO departments (id, name, institution_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)",
    )
    .bind("dept-1")
    .bind("Computer Science")
    .bind("inst-1")
    .bind(now)
    .execute(ctx.state.db())
    .await
    .expect("insert department");

    let (_invitation, raw_token) = test_support::insert_invitation(
        ctx.state.db(),
        "invitee@example.com",
        "Invited Student",
        Some("dept-1"),
        Some(&exam.id),
        &teacher.id,
        now + Duration::hours(48),
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/invitations/validate",
            None,
            Some(json!({"token": raw_token.clone()})),
        ))
        .await
        .expect("validate");
    let status = response.status();
    let preview = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {preview}");
    assert_eq!(preview["email"], "invitee@example.com");
    assert_eq!(preview["department_name"], "Computer Science");
    assert_eq!(preview["institution_name"], "Example University");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/invitations/accept",
            None,
            Some(json!({"token": raw_token.clone(), "password": "invitee-pass"})),
        ))
        .await
        .expect("accept");

    let status = response.status();
    let accepted = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {accepted}");
    assert_eq!(accepted["user"]["email"], "invitee@example.com");
    assert_eq!(accepted["user"]["institution_id"], "inst-1");
    assert_eq!(accepted["exam_id"], exam.id.as_str());
    let student_id = accepted["user"]["id"].as_str().expect("student id").to_string();

    // Both the invitation's exam and the pre-existing assignment are linked.
    let linked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM exam_assignments WHERE student_id = $1",
    )
    .bind(&student_id)
    .fetch_one(ctx.state.db())
    .await
    .expect("count assignments");
    assert_eq!(linked, 2);

    // The token is single-use.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/invitations/accept",
            None,
            Some(json!({"token": raw_token, "password": "invitee-pass"})),
        ))
        .await
        .expect("accept again");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expired_invitation_is_rejected_without_creating_account() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "teacher@example.com",
        "Teacher",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;

    let now = primitive_now_utc();
    let (_invitation, raw_token) = test_support::insert_invitation(
        ctx.state.db(),
        "late@example.com",
        "Late Student",
        None,
        None,
        &teacher.id,
        now - Duration::hours(1),
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/invitations/accept",
            None,
            Some(json!({"token": raw_token, "password": "late-pass-1"})),
        ))
        .await
        .expect("accept expired");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let account = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind("late@example.com")
        .fetch_one(ctx.state.db())
        .await
        .expect("count users");
    assert_eq!(account, 0);

    // A token that never existed is a 404, not a validation error.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/invitations/validate",
            None,
            Some(json!({"token": "no-such-token"})),
        ))
        .await
        .expect("validate unknown");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn exam_crud_requires_teacher_and_hides_answers_from_responses() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "teacher@example.com",
        "Teacher",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student@example.com",
        "Student",
        UserRole::Student,
        "student-pass",
    )
    .await;
    let teacher_token = test_support::bearer_token(&teacher.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&teacher_token),
            Some(json!({
                "title": "Algorithms Quiz",
                "start_time": "2026-09-01T09:00:00Z",
                "end_time": "2026-09-01T12:00:00Z",
                "duration_minutes": 90
            })),
        ))
        .await
        .expect("create exam");

    let status = response.status();
    let exam = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {exam}");
    let exam_id = exam["id"].as_str().expect("exam id").to_string();
    assert!(exam["unique_code"].as_str().expect("code").starts_with("EX-"));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/questions"),
            Some(&teacher_token),
            Some(json!({
                "kind": "mcq",
                "prompt": "2 + 2 = ?",
                "options": ["3", "4", "5"],
                "correct_answer": "4",
                "points": 2.0,
                "position": 1
            })),
        ))
        .await
        .expect("create question");

    let status = response.status();
    let question = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {question}");
    assert!(question.get("correct_answer").is_none(), "response leaks answer: {question}");

    // Students cannot reach the authoring surface.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{exam_id}"),
            Some(&student_token),
            None,
        ))
        .await
        .expect("get exam as student");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
