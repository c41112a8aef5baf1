fn main() -> anyhow::Result<()> {
    kake::run()
}
