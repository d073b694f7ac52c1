//! Main entry point for CLI command to start server.

fn main() -> anyhow::Result<()> {
    envelop_router::main()
}
