mod api_tests;
mod auth_flow_tests;
mod contact_tests;
mod favorites_tests;
