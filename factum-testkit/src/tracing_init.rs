/// Install a `tracing` subscriber writing to the test harness's captured
/// output. Safe to call from every test — a second call's "already
/// initialized" error is ignored.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
