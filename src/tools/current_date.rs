//! Current date tool - gives the model today's date

use super::{Tool, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct CurrentDateTool;

#[async_trait]
impl Tool for CurrentDateTool {
    fn name(&self) -> &'static str {
        "get_current_date"
    }

    fn description(&self) -> String {
        "Get today's date in ISO format (YYYY-MM-DD).".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn run(&self, _input: Value) -> ToolOutput {
        ToolOutput::success(today_iso())
    }
}

fn today_iso() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}
