use serde_json::json;
use serde_json::Value;

pub fn artwork_fixture(id: i64, status: &str) -> Value {
    let result_image_url = if status == "completed" {
        Value::String(format!("https://cdn.example.com/results/{id}.png"))
    } else {
        Value::Null
    };

    return json!({
        "id": id,
        "user_id": 7,
        "style_id": 3,
        "style_name": "Ink Wash",
        "source_image_url": format!("https://cdn.example.com/sources/{id}.jpg"),
        "result_image_url": result_image_url,
        "status": status,
        "is_public": false,
        "public_scope": "result_only",
        "likes_count": 0,
        "views_count": 0,
        "error_message": null,
        "created_at": "2024-05-01T10:00:00",
        "updated_at": "2024-05-01T10:00:00",
        "is_liked_by_current_user": false
    });
}

/// A page of three artworks where the first and last are still generating.
pub fn artwork_page_fixture() -> String {
    return Value::Array(vec![
        artwork_fixture(41, "processing"),
        artwork_fixture(42, "completed"),
        artwork_fixture(43, "processing"),
    ])
    .to_string();
}

pub fn wechat_login_fixture(token: &str) -> String {
    return json!({
        "access_token": token,
        "token_type": "bearer",
        "user": {
            "id": 7,
            "nickname": "Lin",
            "avatar_url": "https://cdn.example.com/avatars/7.png",
            "credits": 120
        }
    })
    .to_string();
}
