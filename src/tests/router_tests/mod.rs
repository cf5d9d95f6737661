mod analytics_tests;
mod auth_flow_tests;
mod incidents_tests;
mod stats_tests;
