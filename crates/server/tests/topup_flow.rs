mod support;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use service::users::UserRepository;

use support::{build_app, build_app_with_limit, json_body, login, multipart_body, TestApp, USER_ID};

const BOUNDARY: &str = "X-PORTAL-BOUNDARY";

fn gift_request(token: Option<&str>, body: serde_json::Value) -> anyhow::Result<Request<Body>> {
    let mut req = Request::post("/api/topup/truemoney").header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        req = req.header(header::COOKIE, format!("session={t}"));
    }
    Ok(req.body(Body::from(serde_json::to_vec(&body)?))?)
}

fn slip_request(token: &str, body: Vec<u8>) -> anyhow::Result<Request<Body>> {
    Ok(Request::post("/api/topup/slip")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .header(header::COOKIE, format!("session={token}"))
        .body(Body::from(body))?)
}

async fn balance(app: &TestApp) -> anyhow::Result<f64> {
    Ok(app.users.find(USER_ID).await?.map(|u| u.credits).unwrap_or_default())
}

async fn upload_dir_is_empty(app: &TestApp) -> anyhow::Result<bool> {
    let mut entries = match tokio::fs::read_dir(app.upload_dir()).await {
        Ok(e) => e,
        Err(_) => return Ok(true),
    };
    Ok(entries.next_entry().await?.is_none())
}

#[tokio::test]
async fn unauthenticated_topups_are_401() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app
        .send(gift_request(None, json!({"link": "https://gift.truemoney.com/campaign/?v=1"}))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(resp).await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Unauthorized");

    let req = Request::post("/api/topup/slip")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(BOUNDARY, Some("100"), Some(("slip.png", &b"png"[..])))))?;
    assert_eq!(app.send(req).await?.status(), StatusCode::UNAUTHORIZED);
    app.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn gift_link_with_voucher_domain_credits_user() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app).await?;

    let resp = app
        .send(gift_request(
            Some(&token),
            json!({"link": "https://gift.truemoney.com/campaign/?v=0195a5c3", "phone": "0812345678"}),
        )?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["success"], true);
    let amount = body["amount"].as_f64().expect("amount");
    assert!((20.0..=119.0).contains(&amount));
    assert_eq!(body["balance"].as_f64(), Some(amount));
    assert_eq!(balance(&app).await?, amount);

    let events = app.events(1).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user_id, USER_ID);
    assert_eq!(events[0].message, format!("Topup TrueMoney: {amount} THB"));
    app.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn gift_link_without_voucher_domain_is_rejected() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app).await?;

    for body in [json!({"link": "https://example.com/gift"}), json!({})] {
        let resp = app.send(gift_request(Some(&token), body)?).await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await?;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid gift link");
    }
    assert_eq!(balance(&app).await?, 0.0);
    assert!(app.notifier.events().await.is_empty());
    app.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn slip_upload_credits_claimed_amount_and_discards_file() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app).await?;

    let body = multipart_body(BOUNDARY, Some("250.75"), Some(("slip.png", &b"\x89PNG\r\n\x1a\n"[..])));
    let resp = app.send(slip_request(&token, body)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["amount"], 250.75);
    assert_eq!(balance(&app).await?, 250.75);
    assert!(upload_dir_is_empty(&app).await?);

    let events = app.events(1).await;
    assert_eq!(events[0].message, "Topup Slip: 250.75 THB");
    app.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn slip_without_file_is_rejected() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app).await?;

    let resp = app.send(slip_request(&token, multipart_body(BOUNDARY, Some("100"), None))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No file uploaded");
    assert_eq!(balance(&app).await?, 0.0);
    app.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn slip_with_unusable_amount_is_400_and_file_removed() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app).await?;

    for amount in [Some("abc"), Some("-10"), None] {
        let body = multipart_body(BOUNDARY, amount, Some(("slip.png", &b"png"[..])));
        let resp = app.send(slip_request(&token, body)?).await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{amount:?}");
        assert_eq!(json_body(resp).await?["success"], false);
    }
    assert_eq!(balance(&app).await?, 0.0);
    assert!(upload_dir_is_empty(&app).await?);
    app.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn topups_accumulate() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app).await?;

    for amount in ["100", "50"] {
        let body = multipart_body(BOUNDARY, Some(amount), Some(("slip.jpg", &b"jpg"[..])));
        assert_eq!(app.send(slip_request(&token, body)?).await?.status(), StatusCode::OK);
    }
    let req = Request::get("/api/user")
        .header(header::COOKIE, format!("session={token}"))
        .body(Body::empty())?;
    assert_eq!(json_body(app.send(req).await?).await?["credits"], 150.0);
    assert_eq!(app.events(2).await.len(), 2);
    app.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn balance_overflow_is_refused_and_store_reloads() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app).await?;

    let first = multipart_body(BOUNDARY, Some("1e308"), Some(("slip.png", &b"png"[..])));
    let resp = app.send(slip_request(&token, first)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await?["balance"], 1e308);

    let second = multipart_body(BOUNDARY, Some("1e308"), Some(("slip.png", &b"png"[..])));
    let resp = app.send(slip_request(&token, second)?).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid amount");

    let req = Request::get("/api/user")
        .header(header::COOKIE, format!("session={token}"))
        .body(Body::empty())?;
    assert_eq!(json_body(app.send(req).await?).await?["credits"], 1e308);

    let reloaded = app.reload_users().await?;
    assert_eq!(reloaded.find(USER_ID).await?.map(|u| u.credits), Some(1e308));
    assert!(upload_dir_is_empty(&app).await?);
    app.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn oversized_slip_is_413_and_nothing_is_kept() -> anyhow::Result<()> {
    let app = build_app_with_limit(1024).await?;
    let token = login(&app).await?;

    let big = vec![0u8; 4096];
    let body = multipart_body(BOUNDARY, Some("100"), Some(("slip.png", &big[..])));
    let resp = app.send(slip_request(&token, body)?).await?;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(resp).await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "File too large");

    assert_eq!(balance(&app).await?, 0.0);
    assert!(upload_dir_is_empty(&app).await?);
    assert!(app.notifier.events().await.is_empty());

    // a slip under the limit still goes through
    let body = multipart_body(BOUNDARY, Some("100"), Some(("slip.png", &b"png"[..])));
    assert_eq!(app.send(slip_request(&token, body)?).await?.status(), StatusCode::OK);
    assert_eq!(balance(&app).await?, 100.0);
    app.cleanup().await;
    Ok(())
}

async fn counter(app: &TestApp, series: &str) -> anyhow::Result<f64> {
    let resp = app.send(Request::get("/metrics").body(Body::empty())?).await?;
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let text = String::from_utf8(bytes.to_vec())?;
    Ok(text
        .lines()
        .find_map(|l| l.strip_prefix(series).and_then(|v| v.trim().parse().ok()))
        .unwrap_or(0.0))
}

#[tokio::test]
async fn handlers_count_credited_and_rejected_topups() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app).await?;
    let credited = r#"portal_topups_total{method="TrueMoney"}"#;
    let rejected = "portal_topup_rejected_total";

    let before = counter(&app, credited).await?;
    let resp = app
        .send(gift_request(Some(&token), json!({"link": "https://gift.truemoney.com/campaign/?v=7"}))?)
        .await?;
    assert_eq!(json_body(resp).await?["success"], true);
    assert!(counter(&app, credited).await? >= before + 1.0);

    let before = counter(&app, rejected).await?;
    let resp = app.send(gift_request(Some(&token), json!({"link": "https://example.com"}))?).await?;
    assert_eq!(json_body(resp).await?["success"], false);
    assert!(counter(&app, rejected).await? >= before + 1.0);
    app.cleanup().await;
    Ok(())
}
