use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub keys: Vec<String>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct HashResponse {
    pub hash: String,
    pub message: String,
}
