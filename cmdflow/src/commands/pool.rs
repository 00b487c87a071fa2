//! Pool commands.

use serde_json::Value;

use super::{value_to_string, Args};
use crate::core::{CommandPayload, Pipeline, Stage};
use crate::errors::CmdflowError;

/// Pool variables settable with `osd pool set`.
pub const POOL_PROPERTIES: &[&str] = &[
    "size",
    "min_size",
    "crash_replay_interval",
    "pg_num",
    "pgp_num",
    "crush_ruleset",
    "hashpspool",
];

/// Request argument and `osd pool set-quota` field pairs.
pub const POOL_QUOTA_PROPERTIES: &[(&str, &str)] = &[
    ("quota_max_bytes", "max_bytes"),
    ("quota_max_objects", "max_objects"),
];

/// Returns the argument names that are neither pool properties nor quotas.
#[must_use]
pub fn invalid_pool_args(args: &Args) -> Vec<String> {
    args.keys()
        .filter(|key| {
            !POOL_PROPERTIES.contains(&key.as_str())
                && !POOL_QUOTA_PROPERTIES.iter().any(|(arg, _)| *arg == key.as_str())
        })
        .cloned()
        .collect()
}

/// One stage setting every property and quota present in `args`.
///
/// The settings are independent and run concurrently.
#[must_use]
pub fn pool_update_stage(pool: &str, args: &Args) -> Stage {
    let mut commands = Vec::new();

    for var in POOL_PROPERTIES {
        if let Some(val) = args.get(*var) {
            commands.push(
                CommandPayload::new("osd pool set")
                    .with_arg("pool", pool)
                    .with_arg("var", *var)
                    .with_arg("val", val.clone()),
            );
        }
    }

    for (var, field) in POOL_QUOTA_PROPERTIES {
        if let Some(val) = args.get(*var) {
            commands.push(
                CommandPayload::new("osd pool set-quota")
                    .with_arg("pool", pool)
                    .with_arg("field", *field)
                    .with_arg("val", value_to_string(val)),
            );
        }
    }

    commands
}

/// Pipeline updating an existing pool.
pub fn pool_update_pipeline(pool: &str, args: &Args) -> Result<Pipeline, CmdflowError> {
    reject_invalid(args)?;
    Ok(vec![pool_update_stage(pool, args)])
}

/// Pipeline creating a pool, then applying the remaining properties.
///
/// `name` and `pg_num` are required.
pub fn pool_create_pipeline(args: &Args) -> Result<Pipeline, CmdflowError> {
    let mut args = args.clone();

    let name = match args.remove("name") {
        Some(Value::String(name)) => name,
        Some(_) | None => {
            return Err(CmdflowError::invalid(
                "You need to specify the pool \"name\" argument",
            ))
        }
    };
    let Some(pg_num) = args.remove("pg_num") else {
        return Err(CmdflowError::invalid(
            "You need to specify the \"pg_num\" argument",
        ));
    };
    reject_invalid(&args)?;

    let create = CommandPayload::new("osd pool create")
        .with_arg("pool", name.as_str())
        .with_arg("pg_num", pg_num);

    Ok(vec![vec![create], pool_update_stage(&name, &args)])
}

/// Pipeline deleting a pool.
#[must_use]
pub fn pool_delete_pipeline(pool: &str) -> Pipeline {
    vec![vec![CommandPayload::new("osd pool delete")
        .with_arg("pool", pool)
        .with_arg("pool2", pool)
        .with_arg("sure", "--yes-i-really-really-mean-it")]]
}

fn reject_invalid(args: &Args) -> Result<(), CmdflowError> {
    let invalid = invalid_pool_args(args);
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(CmdflowError::invalid(format!(
            "Invalid arguments found: {invalid:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn args(value: Value) -> Args {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn describe(pipeline: &Pipeline) -> Vec<Vec<String>> {
        pipeline
            .iter()
            .map(|stage| stage.iter().map(CommandPayload::describe).collect())
            .collect()
    }

    #[test]
    fn test_invalid_pool_args() {
        let invalid = invalid_pool_args(&args(json!({
            "size": 3,
            "quota_max_bytes": 10,
            "colour": "blue",
        })));
        assert_eq!(invalid, vec!["colour"]);
    }

    #[test]
    fn test_update_stage_sets_properties_and_quotas() {
        let stage = pool_update_stage(
            "rbd",
            &args(json!({"size": 3, "quota_max_objects": 100})),
        );

        assert_eq!(
            stage.iter().map(CommandPayload::describe).collect::<Vec<_>>(),
            vec![
                "osd pool set pool=rbd val=3 var=size",
                "osd pool set-quota field=max_objects pool=rbd val=100",
            ]
        );
    }

    #[test]
    fn test_update_pipeline_rejects_unknown() {
        let err = pool_update_pipeline("rbd", &args(json!({"bogus": 1}))).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_update_pipeline_without_changes() {
        let pipeline = pool_update_pipeline("rbd", &Args::new()).unwrap();
        assert_eq!(pipeline, vec![Vec::<CommandPayload>::new()]);
    }

    #[test]
    fn test_create_pipeline() {
        let pipeline = pool_create_pipeline(&args(json!({
            "name": "rbd",
            "pg_num": 64,
            "size": 2,
        })))
        .unwrap();

        assert_eq!(
            describe(&pipeline),
            vec![
                vec!["osd pool create pg_num=64 pool=rbd".to_string()],
                vec!["osd pool set pool=rbd val=2 var=size".to_string()],
            ]
        );
    }

    #[test]
    fn test_create_requires_name_and_pg_num() {
        let missing_name = pool_create_pipeline(&args(json!({"pg_num": 8}))).unwrap_err();
        assert!(missing_name.to_string().contains("\"name\""));

        let missing_pg = pool_create_pipeline(&args(json!({"name": "rbd"}))).unwrap_err();
        assert!(missing_pg.to_string().contains("\"pg_num\""));
    }

    #[test]
    fn test_create_rejects_invalid_args() {
        let err = pool_create_pipeline(&args(json!({
            "name": "rbd",
            "pg_num": 8,
            "owner": "me",
        })))
        .unwrap_err();
        assert!(matches!(err, CmdflowError::InvalidArguments(_)));
    }

    #[test]
    fn test_delete_pipeline() {
        let pipeline = pool_delete_pipeline("rbd");
        assert_eq!(
            describe(&pipeline),
            vec![vec![
                "osd pool delete pool=rbd pool2=rbd sure=--yes-i-really-really-mean-it".to_string()
            ]]
        );
    }
}
