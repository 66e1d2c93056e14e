fn main() -> anyhow::Result<()> {
    gbf_autopilot_lib::run()
}
