//! MCP (Model Context Protocol) tool surface.

pub mod server;
mod tools;

pub use server::McpServer;
pub use tools::{
    AggregatedSearchHandler, ArxivSearchHandler, CitationNetworkHandler, OpenAlexSearchHandler,
    SemanticScholarSearchHandler, Tool, ToolHandler, ToolRegistry,
};
