//! MCP service implementation using rmcp.
//!
//! `GatewayService` exposes the database tools and a few workflow prompts
//! over MCP. Each tool call runs on its own task so a panicking handler
//! surfaces as an unknown error for that call alone.

use crate::db::AdapterRegistry;
use crate::error::{DbError, DbResult};
use crate::models::ConnectionStatus;
use crate::tools::query::{
    ExecuteQueryInput, ExecuteQueryOutput, QueryToolHandler, SampleDataInput, SampleDataOutput,
};
use crate::tools::schema::{
    DatabaseInput, DescribeTableInput, DescribeTableOutput, ListDatabasesOutput,
    ListSchemasOutput, ListTablesInput, ListTablesOutput, SchemaToolHandler,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::router::prompt::PromptRouter,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        GetPromptRequestParam, GetPromptResult, Implementation, ListPromptsResult,
        PaginatedRequestParam, PromptMessage, PromptMessageRole, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    RoleServer,
    prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router,
};
use std::future::Future;
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct GatewayService {
    /// Adapters for every configured database
    registry: Arc<AdapterRegistry>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
    /// Prompt router for the workflow prompts (auto-generated)
    prompt_router: PromptRouter<Self>,
}

impl GatewayService {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self {
            registry,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    fn query_handler(&self) -> QueryToolHandler {
        QueryToolHandler::new(self.registry.clone())
    }

    fn schema_handler(&self) -> SchemaToolHandler {
        SchemaToolHandler::new(self.registry.clone())
    }
}

/// Run a tool future on its own task and map the outcome to an MCP result.
async fn run_tool<T, F>(tool: &'static str, fut: F) -> Result<Json<T>, McpError>
where
    T: Send + 'static,
    F: Future<Output = DbResult<T>> + Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(result) => result.map(Json).map_err(McpError::from),
        Err(join_err) => {
            error!(tool, error = %join_err, "Tool task failed");
            Err(DbError::unknown(format!("Unexpected error in {tool}"))
                .with_details(join_err.to_string())
                .into())
        }
    }
}

#[tool_router]
impl GatewayService {
    #[tool(
        description = "List all configured databases.\nReturns database names, types (postgresql/mysql/sqlite/db2), and read-only status."
    )]
    async fn list_databases(&self) -> Json<ListDatabasesOutput> {
        Json(self.schema_handler().list_databases())
    }

    #[tool(
        description = "Execute a SQL query and return results.\nRead-only databases accept only SELECT queries. Comments and multiple statements are rejected.\nSupports positional parameters to prevent SQL injection."
    )]
    async fn execute_query(
        &self,
        Parameters(input): Parameters<ExecuteQueryInput>,
    ) -> Result<Json<ExecuteQueryOutput>, McpError> {
        let handler = self.query_handler();
        run_tool("execute_query", async move { handler.execute_query(input).await }).await
    }

    #[tool(description = "List tables in a database.\nCan filter by schema name.")]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<Json<ListTablesOutput>, McpError> {
        let handler = self.schema_handler();
        run_tool("list_tables", async move { handler.list_tables(input).await }).await
    }

    #[tool(
        description = "Describe the columns of a table.\nReturns name, type, nullability, primary key flag, and default for each column."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<Json<DescribeTableOutput>, McpError> {
        let handler = self.schema_handler();
        run_tool("describe_table", async move { handler.describe_table(input).await }).await
    }

    #[tool(description = "List user schemas in a database.\nSQLite has no schemas and returns an empty list.")]
    async fn list_schemas(
        &self,
        Parameters(input): Parameters<DatabaseInput>,
    ) -> Result<Json<ListSchemasOutput>, McpError> {
        let handler = self.schema_handler();
        run_tool("list_schemas", async move { handler.list_schemas(input).await }).await
    }

    #[tool(
        description = "Test connectivity to a database.\nReports version, database name, and table count, or the connection error."
    )]
    async fn test_connection(
        &self,
        Parameters(input): Parameters<DatabaseInput>,
    ) -> Result<Json<ConnectionStatus>, McpError> {
        let handler = self.schema_handler();
        run_tool("test_connection", async move { handler.test_connection(input).await }).await
    }

    #[tool(description = "Return sample rows from a table.\nDefault 10 rows, max 100.")]
    async fn get_sample_data(
        &self,
        Parameters(input): Parameters<SampleDataInput>,
    ) -> Result<Json<SampleDataOutput>, McpError> {
        let handler = self.query_handler();
        run_tool("get_sample_data", async move { handler.get_sample_data(input).await }).await
    }
}

fn user_prompt(text: &str) -> Vec<PromptMessage> {
    vec![PromptMessage::new_text(PromptMessageRole::User, text)]
}

#[prompt_router]
impl GatewayService {
    /// Guided walk through a database, from connection check to sample rows.
    #[prompt(description = "Guided database exploration workflow")]
    async fn explore_database(&self) -> Vec<PromptMessage> {
        user_prompt(
            "Let's explore a database together:\n\
            \n\
            1. Use `list_databases` to see every configured database\n\
            2. Pick one and run `test_connection` to check it is reachable\n\
            3. Use `list_schemas` to see its schemas (SQLite has none)\n\
            4. Use `list_tables` to see its tables\n\
            5. For interesting tables, use `describe_table` to see their columns\n\
            6. Use `get_sample_data` with a small limit to preview rows\n\
            7. Based on the schema, suggest useful queries\n\
            \n\
            Databases are read-only unless configured otherwise.",
        )
    }

    /// Parameterized querying with the placeholder style of each backend.
    #[prompt(description = "Write safe parameterized queries")]
    async fn query_with_safety(&self) -> Vec<PromptMessage> {
        user_prompt(
            "Help me query a database safely:\n\
            \n\
            1. I'll describe what data I need and from which database\n\
            2. Write a single SELECT statement with placeholders:\n\
               - PostgreSQL: `$1`, `$2`, ...\n\
               - MySQL, SQLite and DB2: `?`\n\
            3. Keep the values separate from the SQL text\n\
            4. Run it with `execute_query`, passing the values in `parameters`\n\
            5. Present the results as a readable table and suggest follow-ups\n\
            \n\
            Rules:\n\
            - Read-only databases accept only SELECT queries\n\
            - Comments and multiple statements are rejected\n\
            - Never concatenate user input into SQL",
        )
    }

    /// Column-level review of a table and its likely relationships.
    #[prompt(description = "Analyze table structure and relationships")]
    async fn analyze_table_structure(&self) -> Vec<PromptMessage> {
        user_prompt(
            "I need to analyze a table structure:\n\
            \n\
            1. Use `list_databases` and `list_tables` to find the table\n\
            2. Use `describe_table` on the table I name\n\
            3. Analyze the columns:\n\
               - primary keys and their types\n\
               - foreign key naming patterns such as `_id` or `_key` suffixes\n\
               - nullable and non-nullable columns\n\
               - data types and what they imply\n\
            4. Suggest relationships with other tables based on column names\n\
            5. Propose `execute_query` statements that confirm them",
        )
    }
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for GatewayService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_prompts()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "db-gateway".to_owned(),
                title: Some("Database Gateway".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Database tools for querying configured SQL databases.\n\
                \n\
                ## Workflow\n\
                1. Call `list_databases` to get the configured database names\n\
                2. Explore with `list_schemas`, `list_tables`, `describe_table` and `get_sample_data`\n\
                3. Run SQL with `execute_query`\n\
                \n\
                ## Rules\n\
                - Read-only databases accept only SELECT queries\n\
                - Comments (`--`, `/* */`) and multiple statements are always rejected\n\
                - Pass values through `parameters` instead of embedding them in SQL\n\
                - Placeholders: `$1, $2` for PostgreSQL, `?` for MySQL, SQLite and DB2"
                    .to_string(),
            ),
        }
    }
}
