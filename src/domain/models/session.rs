use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Credentials {
    /// Mini-program login with a `wx.login` code.
    WeChat {
        code: String,
        user_info: Option<Value>,
    },
    /// Dashboard login.
    Admin { username: String, password: String },
}

impl Credentials {
    pub fn path(&self) -> &'static str {
        match self {
            Credentials::WeChat { .. } => return "/auth/wechat/login",
            Credentials::Admin { .. } => return "/login",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Credentials::WeChat { code, user_info } => {
                if let Some(info) = user_info {
                    return json!({ "code": code, "user_info": info });
                }
                return json!({ "code": code });
            }
            Credentials::Admin { username, password } => {
                return json!({ "username": username, "password": password });
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub admin: Option<Value>,
}

impl LoginResponse {
    /// Mini-program logins return `user`, dashboard logins `admin`.
    pub fn profile(&self) -> Value {
        return self
            .user
            .clone()
            .or_else(|| return self.admin.clone())
            .unwrap_or(Value::Null);
    }
}

pub fn display_name(profile: &Value) -> String {
    for field in ["nickname", "username"] {
        if let Some(name) = profile.get(field).and_then(|e| return e.as_str()) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }

    if let Some(id) = profile.get("id") {
        return format!("user {id}");
    }

    return "unknown user".to_string();
}
