pub mod case_api_client;

pub use case_api_client::CaseApiClient;
