mod app;
mod config;
mod emit;
mod loader;
mod localize;
mod ocr;

fn main() -> cosmic::iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    localize::localize();
    app::run()
}
