use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::net::SocketAddr;
use std::path::PathBuf;

use iris_serving::commands::manage::{delete_bundle, format_listing, list_bundles};
use iris_serving::commands::package::{load_package_config, run_package, PackageConfig};
use iris_serving::commands::predict::{run_predict, write_predictions, PredictInput};
use iris_serving::server::{self, AppState};
use iris_serving::util::{artifact_store, resolve_bundle};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or(
            "IRIS_SERVING_LOG",
            "error,iris_serving=info,iris_classifier=info",
        ))
        .init();

    let bundle_arg = || {
        Arg::new("bundle")
            .help("Bundle directory, or a tag such as IrisClassifier:latest")
            .required(true)
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .value_hint(ValueHint::AnyPath)
    };

    let matches = Command::new("iris-serving")
        .version(clap::crate_version!())
        .about("Train, package and serve an Iris support-vector classifier")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("artifact_home")
                .long("artifact-home")
                .global(true)
                .help(
                    "Root directory of the artifact store. Overrides IRIS_SERVING_HOME \
                     and the artifact_home of a package config.",
                )
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::DirPath),
        )
        .subcommand(
            Command::new("package")
                .about("Train the classifier, pack it into the service and save a bundle")
                .arg(
                    Arg::new("config")
                        .help("Optional JSON packaging configuration")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("Service name to save the bundle under. Overrides the config file.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("print_config")
                        .long("print-config")
                        .help("Print the effective configuration and exit.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("list").about("List saved bundles"))
        .subcommand(
            Command::new("predict")
                .about("Predict labels for a batch of feature rows with a saved bundle")
                .arg(bundle_arg())
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .help("JSON array of feature rows, e.g. '[[5.1, 3.5, 1.4, 0.2]]'")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .conflicts_with("input_file")
                        .required_unless_present("input_file"),
                )
                .arg(
                    Arg::new("input_file")
                        .short('f')
                        .long("input-file")
                        .help("CSV or TSV file of feature rows with a header line")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Write predictions to a CSV/TSV file instead of stdout")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve a saved bundle over HTTP")
                .arg(bundle_arg())
                .arg(
                    Arg::new("host")
                        .long("host")
                        .default_value("127.0.0.1")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .default_value("5000")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a saved bundle")
                .arg(
                    Arg::new("bundle")
                        .help("Bundle tag, Name:version or Name:latest")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                ),
        )
        .get_matches();

    let (name, sub_m) = matches
        .subcommand()
        .expect("Subcommand is required by CLI configuration");
    let home = sub_m.get_one::<PathBuf>("artifact_home").cloned();

    let result = match name {
        "package" => handle_package(sub_m, home),
        "list" => handle_list(home),
        "predict" => handle_predict(sub_m, home),
        "serve" => handle_serve(sub_m, home),
        "delete" => handle_delete(sub_m, home),
        _ => unreachable!(),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn handle_package(matches: &ArgMatches, home: Option<PathBuf>) -> Result<()> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("[IrisServing::Package] Using config: {:?}", path);
            load_package_config(path)?
        }
        None => PackageConfig::default(),
    };

    if let Some(name) = matches.get_one::<String>("name") {
        config.service_name = name.clone();
    }
    if home.is_some() {
        config.artifact_home = home;
    }

    if matches.get_flag("print_config") {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let saved_path = run_package(&config)?;
    println!("{}", saved_path.display());
    Ok(())
}

fn handle_list(home: Option<PathBuf>) -> Result<()> {
    let store = artifact_store(home.as_ref());
    let bundles = list_bundles(&store)?;
    if bundles.is_empty() {
        log::info!("No bundles in {}", store.root().display());
    }
    print!("{}", format_listing(&bundles));
    Ok(())
}

fn handle_predict(matches: &ArgMatches, home: Option<PathBuf>) -> Result<()> {
    let store = artifact_store(home.as_ref());
    let bundle: &String = matches.get_one("bundle").expect("bundle is required");
    let bundle_dir = resolve_bundle(bundle, &store)?;

    let input = match matches.get_one::<String>("input") {
        Some(json) => PredictInput::Json(json.clone()),
        None => PredictInput::File(
            matches
                .get_one::<String>("input_file")
                .cloned()
                .context("One of --input or --input-file is required")?,
        ),
    };

    let labels = run_predict(&bundle_dir, &input)?;
    match matches.get_one::<PathBuf>("output_file") {
        Some(path) => {
            write_predictions(&labels, path)?;
            log::info!("Wrote {} predictions to {}", labels.len(), path.display());
        }
        None => println!("{}", serde_json::to_string(&labels)?),
    }
    Ok(())
}

fn handle_serve(matches: &ArgMatches, home: Option<PathBuf>) -> Result<()> {
    let store = artifact_store(home.as_ref());
    let bundle: &String = matches.get_one("bundle").expect("bundle is required");
    let bundle_dir = resolve_bundle(bundle, &store)?;

    let host: &String = matches.get_one("host").expect("host has a default");
    let port: u16 = *matches.get_one("port").expect("port has a default");
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let state = AppState::from_bundle(&bundle_dir)?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(server::serve(state, addr))
}

fn handle_delete(matches: &ArgMatches, home: Option<PathBuf>) -> Result<()> {
    let store = artifact_store(home.as_ref());
    let tag: &String = matches.get_one("bundle").expect("bundle is required");
    let removed = delete_bundle(&store, tag)?;
    println!("{}", removed.display());
    Ok(())
}
