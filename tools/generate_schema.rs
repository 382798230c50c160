//! JSON Schema + Markdown生成ツール
//!
//! src/domain/config.rsの設定構造から以下を自動生成します：
//! 1. JSON Schema (schema/config.json)
//! 2. Markdownドキュメント (CONFIGURATION.md)
//!
//! 実行方法:
//! ```
//! cargo run --bin generate_schema
//! ```

use schemars::schema_for;
use serde_json::{Map, Value};
use std::fs;
use BigKahuna::domain::config::AppConfig;

fn main() {
    println!("JSON Schema + Markdown生成中...");

    // AppConfigからJSON Schemaを生成
    let schema = schema_for!(AppConfig);

    // JSON文字列に変換（prettify）
    let json = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema to JSON");

    // schema/ディレクトリを作成
    fs::create_dir_all("schema").expect("Failed to create schema/ directory");

    // schema/config.jsonに書き出し
    fs::write("schema/config.json", &json).expect("Failed to write schema/config.json");
    println!("  ✓ schema/config.json");

    // JSON Schemaをパースしてマークダウン生成
    let schema_value: Value =
        serde_json::from_str(&json).expect("Failed to parse generated schema");
    let markdown = generate_markdown(&schema_value);

    // CONFIGURATION.mdに書き出し
    fs::write("CONFIGURATION.md", markdown).expect("Failed to write CONFIGURATION.md");
    println!("  ✓ CONFIGURATION.md");

    println!("✅ 生成完了: schema/config.json + CONFIGURATION.md");
}

/// JSON Schemaからマークダウンドキュメントを生成
///
/// 設定は「セクション → フィールド」の2階層しかないため、トップレベルの
/// $refを1段解決してセクションごとの表を出力する。
fn generate_markdown(schema: &Value) -> String {
    let mut md = String::new();

    md.push_str("# 設定リファレンス (Configuration Reference)\n\n");
    md.push_str("`config.toml`ファイルは、BigKahunaの動作を制御する設定ファイルです。\n");
    md.push_str("ファイルが存在しない、またはパースできない場合はデフォルト値で起動します（警告ログ出力）。\n\n");
    md.push_str("**設定ファイルの場所**: `config.toml` (プロジェクトルート)  \n");
    md.push_str("**スキーマファイル**: `schema/config.json` (自動生成)  \n");
    md.push_str("**サンプル**: `config.toml.example`\n\n");
    md.push_str("⚠️ **注意**: このドキュメント（CONFIGURATION.md）は `cargo run --bin generate_schema` で自動生成されます。\n");
    md.push_str("設定項目の説明を変更する場合は、`src/domain/config.rs`のdoc commentsを編集してください。\n\n");
    md.push_str("## 設定項目\n\n");

    let defs = schema
        .get("$defs")
        .and_then(|d| d.as_object())
        .cloned()
        .unwrap_or_default();

    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, prop) in props {
            let section = resolve_ref(prop, &defs).unwrap_or(prop);

            md.push_str(&format!("### [{}]\n\n", key));
            let desc = description(prop, section);
            if desc != "-" {
                md.push_str(&format!("{}\n\n", desc));
            }
            section_table(&mut md, section, &defs);
        }
    }

    md
}

/// $refを$defsから1段解決
fn resolve_ref<'a>(schema: &'a Value, defs: &'a Map<String, Value>) -> Option<&'a Value> {
    schema
        .get("$ref")
        .and_then(|r| r.as_str())
        .and_then(|r| r.strip_prefix("#/$defs/"))
        .and_then(|name| defs.get(name))
}

/// セクション内フィールドの表を生成
fn section_table(md: &mut String, section: &Value, defs: &Map<String, Value>) {
    let props = match section.get("properties").and_then(|p| p.as_object()) {
        Some(props) if !props.is_empty() => props,
        _ => return,
    };

    md.push_str("| 設定項目 | 型 | デフォルト | 説明 |\n");
    md.push_str("|---------|-----|---------|---------|\n");

    for (key, prop) in props {
        let resolved = resolve_ref(prop, defs).unwrap_or(prop);
        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            key,
            type_string(resolved),
            default_value(prop),
            description(prop, resolved)
        ));
    }
    md.push('\n');
}

/// 型を文字列で取得
fn type_string(schema: &Value) -> String {
    // enum型（doc comment付きvariantはoneOfで表現される）
    if schema.get("enum").is_some() || schema.get("oneOf").is_some() {
        return "enum".to_string();
    }

    match schema.get("type").and_then(|t| t.as_str()) {
        Some("integer") => schema
            .get("format")
            .and_then(|f| f.as_str())
            .unwrap_or("integer")
            .to_string(),
        Some("boolean") => "bool".to_string(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    }
}

/// デフォルト値を取得
fn default_value(schema: &Value) -> String {
    match schema.get("default") {
        Some(Value::String(s)) => format!("`\"{}\"`", s),
        Some(Value::Number(n)) => format!("`{}`", n),
        Some(Value::Bool(b)) => format!("`{}`", b),
        _ => "-".to_string(),
    }
}

/// 説明文を取得（フィールド側を優先し、なければ参照先の定義から）
fn description(field: &Value, resolved: &Value) -> String {
    for schema in [field, resolved] {
        if let Some(desc) = schema.get("description").and_then(|d| d.as_str()) {
            // 表セル用に改行とパイプをエスケープ
            return desc
                .replace("\n\n", "<br><br>")
                .replace('\n', " ")
                .replace('|', "\\|");
        }
    }
    "-".to_string()
}
