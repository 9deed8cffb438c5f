use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use hocon::{Hocon, HoconLoader};

use super::FsExt;

/// Reads options from a HOCON file. Keys are looked up inside `scope` first, then at the
/// root of the document. An environment variable with the same name as the key wins over both.
#[derive(Debug)]
pub struct ConfigLoader {
    hocon: Hocon,
    env: HashMap<String, String>,
    scope: String,
}

impl ConfigLoader {
    pub fn new(path: impl AsRef<Path>, scope: String) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(anyhow!("The config file {:?} was not found", path));
        }

        let hocon = HoconLoader::new()
            .load_file(path)
            .with_context(|| format!("Failed to find or load config file at: {:?}", path))?
            .hocon()
            .with_context(|| format!("Failed to parse config file at: {:?}", path))?;

        Ok(Self::from_hocon(hocon, scope))
    }

    pub fn from_contents(contents: &str, scope: String) -> Result<Self> {
        let hocon = HoconLoader::new()
            .load_str(contents)
            .context("Failed to load config")?
            .hocon()
            .context("Failed to parse config")?;

        Ok(Self::from_hocon(hocon, scope))
    }

    fn from_hocon(hocon: Hocon, scope: String) -> Self {
        let env = std::env::vars().collect::<HashMap<_, _>>();

        Self { hocon, env, scope }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.env.get(name) {
            return Some(Value::String(value.clone()));
        }

        let scope = &self.hocon[self.scope.as_str()];
        if matches!(scope, Hocon::Hash(_)) {
            if let Some(value) = Self::map_hocon(&scope[name]) {
                return Some(value);
            }
        }

        Self::map_hocon(&self.hocon[name])
    }

    pub fn require(&self, name: &str) -> Result<Value> {
        self.get(name)
            .ok_or_else(|| anyhow!("Missing required config value '{}' in scope '{}'", name, self.scope))
    }

    pub fn get_list(&self, name: &str) -> Option<Vec<Value>> {
        self.get(name).map(Value::into_list)
    }

    /// Reads a list and converts every entry with `convert`. A missing key is an empty list.
    pub fn get_list_of<T>(&self, name: &str, convert: impl Fn(&Value) -> Option<T>) -> Result<Vec<T>> {
        self.get_list(name)
            .unwrap_or_default()
            .iter()
            .map(|v| {
                convert(v).ok_or_else(|| anyhow!("Config value '{}' contains an invalid entry {:?}", name, v))
            })
            .collect()
    }

    pub fn get_relative_path(&self, name: &str) -> Result<PathBuf> {
        let value = self.require(name)?;
        let path = value
            .as_string()
            .ok_or_else(|| anyhow!("Config value '{}' is not a path", name))?;

        path.relative_to_cwd()
    }

    pub fn get_relative_paths(&self, name: &str) -> Result<Vec<PathBuf>> {
        let values = self
            .get_list(name)
            .ok_or_else(|| anyhow!("Missing required config value '{}' in scope '{}'", name, self.scope))?;

        values
            .iter()
            .map(|v| {
                v.as_string()
                    .ok_or_else(|| anyhow!("Config value '{}' contains a non path entry", name))
                    .and_then(|p| p.relative_to_cwd())
            })
            .collect()
    }

    pub fn load<T: Config>(&self) -> Result<T> {
        let res = T::load(self)?;
        Ok(res)
    }

    fn map_hocon(hocon: &Hocon) -> Option<Value> {
        match hocon {
            Hocon::Real(f64) => Some(Value::Float(*f64)),
            Hocon::Integer(i64) => Some(Value::Integer(*i64)),
            Hocon::String(string) => Some(Value::String(string.clone())),
            Hocon::Boolean(bool) => Some(Value::Boolean(*bool)),
            Hocon::Array(values) => Some(Value::List(
                values.iter().filter_map(Self::map_hocon).collect(),
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(val) => Some(*val),
            Value::String(val) => match val.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Value::Integer(val) => usize::try_from(*val).ok(),
            Value::String(val) => val.trim().parse::<usize>().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(val) => Some(*val),
            Value::Integer(val) => Some(*val as f64),
            Value::String(val) => val.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::String(val) => Some(val.clone()),
            Value::Boolean(val) => Some(val.to_string()),
            Value::Float(val) => Some(val.to_string()),
            Value::Integer(val) => Some(val.to_string()),
            Value::List(_) => None,
        }
    }

    /// Lists coming from the environment are comma separated strings. An empty string is an empty list.
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Value::List(values) => values,
            Value::String(val) if val.trim().is_empty() => vec![],
            Value::String(val) => val
                .split(',')
                .map(|v| Value::String(v.trim().to_string()))
                .collect(),
            other => vec![other],
        }
    }
}

pub trait Config {
    fn load(config: &ConfigLoader) -> Result<Self>
    where
        Self: Sized;
}
