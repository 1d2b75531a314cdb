pub mod audit_event;
pub mod case;
pub mod court;
pub mod data_validation;
pub mod matching;
