pub mod api_bank;
pub mod call_parser;
pub mod config;
pub mod conversation;
pub mod corpus;
pub mod error;
pub mod json_scan;
pub mod literal;
pub mod observability;
pub mod repair;
pub mod resolver;
pub mod schema;
pub mod tool_alpaca;
pub mod validate;
