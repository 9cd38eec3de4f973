//! Static catalogs
//!
//! The read-only tool catalog and the four seeded agents. Built-in agents
//! have fixed IDs and can never be deleted or edited in place.

use super::agent::{Agent, Performance, DEFAULT_AVATAR};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// IDs reserved by the built-in agents
pub const BUILTIN_AGENT_IDS: [&str; 4] = ["1", "2", "3", "4"];

/// Check whether an ID belongs to a built-in agent
pub fn is_builtin_id(id: &str) -> bool {
    BUILTIN_AGENT_IDS.contains(&id)
}

/// Reference to an entry of the tool catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// Retain information from previous interactions
    Memory,
    /// Access real-time information from the web
    WebBrowser,
    /// Connect to external APIs
    ApiTool,
}

/// Presentation tag for a tool; the view layer maps it to an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolIcon {
    /// Memory stick
    MemoryStick,
    /// Globe
    Globe,
    /// CPU
    Cpu,
}

/// Tool catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tool {
    /// Stable tool identifier
    pub id: ToolKind,
    /// Display name
    pub name: &'static str,
    /// What the tool does
    pub description: &'static str,
    /// Icon tag
    pub icon: ToolIcon,
}

impl ToolKind {
    /// All tools in catalog order
    pub const ALL: [ToolKind; 3] = [ToolKind::Memory, ToolKind::WebBrowser, ToolKind::ApiTool];

    /// Resolve the catalog entry for this tool
    pub fn tool(self) -> Tool {
        match self {
            ToolKind::Memory => Tool {
                id: self,
                name: "Memory",
                description: "Retain information from previous interactions.",
                icon: ToolIcon::MemoryStick,
            },
            ToolKind::WebBrowser => Tool {
                id: self,
                name: "Web Browser",
                description: "Access real-time information from the web.",
                icon: ToolIcon::Globe,
            },
            ToolKind::ApiTool => Tool {
                id: self,
                name: "API Tool",
                description: "Connect to external APIs to fetch data.",
                icon: ToolIcon::Cpu,
            },
        }
    }
}

/// The full tool catalog
pub fn tools() -> Vec<Tool> {
    ToolKind::ALL.iter().map(|kind| kind.tool()).collect()
}

static BUILTIN_AGENTS: Lazy<Vec<Agent>> = Lazy::new(|| {
    vec![
        builtin(
            "1",
            "Market Analyst",
            "An AI agent that analyzes market trends and provides insights.",
            vec![ToolKind::WebBrowser, ToolKind::ApiTool],
            (92, 1.2),
            true,
        ),
        builtin(
            "2",
            "Customer Support",
            "Handles customer queries and resolves issues with empathy.",
            vec![ToolKind::Memory],
            (88, 0.8),
            false,
        ),
        builtin(
            "3",
            "Creative Writer",
            "Generates creative content, from poems to scripts.",
            vec![ToolKind::Memory, ToolKind::WebBrowser],
            (95, 2.5),
            true,
        ),
        builtin(
            "4",
            "Code Assistant",
            "Helps developers with code snippets and debugging.",
            vec![ToolKind::Memory, ToolKind::ApiTool],
            (97, 0.5),
            false,
        ),
    ]
});

fn builtin(
    id: &str,
    name: &str,
    description: &str,
    tools: Vec<ToolKind>,
    (accuracy, response_time): (u8, f64),
    is_deployed: bool,
) -> Agent {
    Agent {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        avatar: DEFAULT_AVATAR.to_string(),
        tools,
        performance: Performance {
            accuracy,
            response_time,
        },
        is_deployed,
        provider: None,
        api_key: None,
        system_prompt: None,
    }
}

/// The seeded agents, in dashboard order
pub fn builtin_agents() -> &'static [Agent] {
    &BUILTIN_AGENTS
}
