use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("altibase_exporter")
        .about("Altibase metric exporter for Prometheus")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("9399")
                .env("WEB_LISTEN_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("server")
                .long("server")
                .help("Altibase server host")
                .default_value("127.0.0.1")
                .env("ALTIBASE_SERVER")
                .value_name("HOST"),
        )
        .arg(
            Arg::new("altibase-port")
                .long("altibase-port")
                .help("Altibase server port")
                .default_value("20300")
                .env("ALTIBASE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .help("Database user")
                .default_value("sys")
                .env("ALTIBASE_USER"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Database password")
                .default_value("manager")
                .env("ALTIBASE_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .help("Database name")
                .default_value("mydb")
                .env("ALTIBASE_DATABASE"),
        )
        .arg(
            Arg::new("connect-timeout")
                .long("connect-timeout")
                .help("Startup connection timeout in seconds")
                .default_value("10")
                .env("ALTIBASE_CONNECT_TIMEOUT")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("queries-file")
                .long("queries-file")
                .help("YAML file with custom queries")
                .env("ALTIBASE_QUERIES_FILE")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("disabled-metrics")
                .long("disabled-metrics")
                .help("Comma-separated metric keys to suppress (exact/case-sensitive, e.g. sysstat,replication_gap)")
                .env("ALTIBASE_DISABLED_METRICS")
                .value_name("key,key,..."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity, -vv for debug")
                .action(ArgAction::Count),
        )
}
