// Adapters layer: concrete clients for external systems (backend API, geolocation, SMS text, signup webhook).

pub mod geo;
pub mod http;
pub mod sms_text;
pub mod webhook;
