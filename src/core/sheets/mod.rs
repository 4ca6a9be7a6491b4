pub mod sheet_ports;

pub use sheet_ports::{
    config_from_rows, emails_from_rows, AllowedEmailSource, AuditLog, AuditRecord, ConfigSource,
    SheetError,
};
