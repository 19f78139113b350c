// tests/config_env.rs
use std::{env, fs};

use tech_news_bot::config::app::{
    ENV_CACHE_TTL_SECS, ENV_CHANNEL_ACCESS_TOKEN, ENV_CHANNEL_SECRET, ENV_CONFIG_PATH, ENV_PORT,
    ENV_PRESS_API_TOKEN,
};
use tech_news_bot::config::AppConfig;

fn clear_env() {
    for k in [
        ENV_CONFIG_PATH,
        ENV_CHANNEL_SECRET,
        ENV_CHANNEL_ACCESS_TOKEN,
        ENV_PORT,
        ENV_CACHE_TTL_SECS,
        ENV_PRESS_API_TOKEN,
    ] {
        env::remove_var(k);
    }
}

#[test]
fn toml_and_json_files_both_load() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("bot.toml");
    fs::write(&p_toml, "[cache]\nttl_secs = 60\n[server]\ntrigger = \"新聞\"\n").unwrap();
    let t = AppConfig::load_from_file(&p_toml).unwrap();
    assert_eq!(t.cache.ttl_secs, 60);
    assert_eq!(t.server.trigger, "新聞");

    let p_json = dir.path().join("bot.json");
    fs::write(&p_json, r#"{"pipeline": {"target_count": 3}, "feeds": []}"#).unwrap();
    let j = AppConfig::load_from_file(&p_json).unwrap();
    assert_eq!(j.pipeline.target_count, 3);
    assert!(j.feeds.is_empty());
}

#[serial_test::serial]
#[test]
fn load_uses_env_path_then_fallbacks_then_overrides() {
    // Isolate CWD so the repo's own config/ is not read.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Nothing on disk -> defaults
    let d = AppConfig::load().unwrap();
    assert_eq!(d.server.port, 8080);
    assert_eq!(d.press_api.token, "");

    // 2) Fallback ./config/news_bot.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/news_bot.toml"),
        "[server]\nport = 9000\n[press_api]\ntoken = \"ENV\"\n",
    )
    .unwrap();
    env::set_var(ENV_PRESS_API_TOKEN, "from-env");
    let f = AppConfig::load().unwrap();
    assert_eq!(f.server.port, 9000);
    assert_eq!(f.press_api.token, "from-env");

    // 3) Env path wins, env overrides win over the file
    let p = tmp.path().join("other.toml");
    fs::write(&p, "[server]\nport = 7000\n[cache]\nttl_secs = 5\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p.display().to_string());
    env::set_var(ENV_PORT, "7100");
    env::set_var(ENV_CACHE_TTL_SECS, "120");
    env::set_var(ENV_CHANNEL_SECRET, "sec");
    env::set_var(ENV_CHANNEL_ACCESS_TOKEN, "tok");
    let e = AppConfig::load().unwrap();
    assert_eq!(e.server.port, 7100);
    assert_eq!(e.cache.ttl_secs, 120);
    assert_eq!(e.line.channel_secret, "sec");
    assert_eq!(e.line.access_token, "tok");

    // 4) Env path to a missing file is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(AppConfig::load().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}
