fn main() -> anyhow::Result<()> {
    momentum_lib::run()
}
