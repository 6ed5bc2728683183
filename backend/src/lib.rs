//! Loan approval prediction service.
//!
//! Serves a pre-trained binary classifier over HTTP: `GET /` answers with a
//! welcome message and `POST /predict` turns an 11-field loan application
//! into `{"loan_status": "Approved" | "Rejected"}`.

pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod routes;
