// Static pages compiled into the binary
pub const LOGIN_PAGE: &str = include_str!("../../templates/login.html");
pub const ERROR_PAGE: &str = include_str!("../../templates/error.html");
pub const INDEX_PAGE: &str = include_str!("../../templates/index.html");
