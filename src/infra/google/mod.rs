pub mod calendar_client;
pub mod service_account;
pub mod sheets_client;

pub use calendar_client::GoogleCalendarClient;
pub use service_account::ServiceAccountAuth;
pub use sheets_client::GoogleSheetsStore;
