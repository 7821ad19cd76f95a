use anyhow::Result;
use async_trait::async_trait;

pub const LOGIN_PAGE: &str = "/pages/login/login";

#[async_trait]
pub trait Navigator {
    /// Location the user is looking at, recorded so login can return to it.
    fn current_location(&self) -> Option<String>;

    /// Shows a short lived notification.
    fn notify(&self, message: &str);

    /// Moves the user to the login page. Resolves once navigation finished,
    /// successfully or not.
    async fn navigate_to_login(&self) -> Result<()>;
}
