#[cfg(not(target_arch = "wasm32"))]
pub fn create_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

/// Keeps the runtime alive on its own thread so requests spawned from the UI
/// have somewhere to run
#[cfg(not(target_arch = "wasm32"))]
pub fn start_background_worker(rt: tokio::runtime::Runtime) {
    std::thread::spawn(move || {
        tracing::info!("Background worker started");
        rt.block_on(async {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }
        })
    });
}
