// API response bodies

use serde::Serialize;

/// `GET /api/hello`
#[derive(Debug, Serialize)]
pub struct HelloResponse<'a> {
    pub message: &'static str,
    pub domain: &'a str,
    pub path: &'a str,
}

/// `GET /api/users`
#[derive(Debug, Serialize)]
pub struct UsersResponse<'a> {
    pub users: &'static [&'static str],
    pub domain: &'a str,
}

/// `POST /api/data`
#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub message: &'static str,
    pub body: String,
}
