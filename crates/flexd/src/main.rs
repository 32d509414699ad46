use std::process::ExitCode;

use flex_config::Config;
use flex_types::{Request, TaskOutcome};
use flexd::{AuthCompletionHandler, CompletionHandler, FlexService, Modules, RegistryError};
use serde_json::json;

fn main() -> ExitCode {
    let result = Config::resolve_from(std::env::args_os())
        .map_err(flexd::LaunchError::from)
        .and_then(|config| flexd::run_with_config(config, register));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("flexd: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn register(service: &mut FlexService) -> Result<(), RegistryError> {
    service
        .functions
        .register("echo", |request: &Request, complete: CompletionHandler, _: &Modules| {
            complete
                .set_json_body(json!({ "echo": request.body.to_json_value() }))
                .ok()
                .done()
        });
    service.auth.register(
        "allow",
        |request: &Request, complete: AuthCompletionHandler, modules: &Modules| {
            modules.logger().info("accepting login");
            complete
                .set_token(format!("token-{}", request.username))
                .ok()
                .done()
        },
    );
    service
        .data
        .service_object("notes")
        .on_get_all(|_: &Request, complete: CompletionHandler, _: &Modules| {
            complete.set_json_body(json!([])).ok().done()
        })
        .register(
            "onGetByID",
            |request: &Request, complete: CompletionHandler, _: &Modules| -> TaskOutcome {
                complete
                    .set_json_body(json!({ "_id": request.entity_id }))
                    .ok()
                    .done()
            },
        )?;
    Ok(())
}
