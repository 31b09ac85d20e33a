//! End-to-end conversion tests over realistic source text.

use pgport::prelude::*;
use pretty_assertions::assert_eq;

const ROUTES_JS: &str = r#"const db = require('./db');

router.get('/users/:id', async (req, res) => {
  const user = await db.get('SELECT * FROM users WHERE id = ? AND is_active = 1', [req.params.id]);
  const recent = await db.all("SELECT * FROM logs WHERE user_id = ? AND created_at > datetime('now', '-7 days')", [user.id]);
  const total = await db.get('SELECT IFNULL(SUM(amount), 0) AS total FROM payments WHERE user_id = ?', [user.id]);
  res.json({ user, recent, total });
});

router.post('/users', async (req, res) => {
  const result = await db.run('INSERT INTO users (name, email, is_admin) VALUES (?, ?, ?)', [req.body.name, req.body.email, req.body.admin ? 1 : 0]);
  await db.run('UPDATE users SET is_deleted = 0 WHERE id = ?', [result.lastID]);
  res.status(201).json({ id: result.lastID });
});
"#;

const ROUTES_PG: &str = r#"const db = require('./db');

router.get('/users/:id', async (req, res) => {
  const user = await db.get('SELECT * FROM users WHERE id = $1 AND is_active = true', [req.params.id]);
  const recent = await db.all("SELECT * FROM logs WHERE user_id = $1 AND created_at > CURRENT_TIMESTAMP - INTERVAL '7 days'", [user.id]);
  const total = await db.get('SELECT COALESCE(SUM(amount), 0) AS total FROM payments WHERE user_id = $1', [user.id]);
  res.json({ user, recent, total });
});

router.post('/users', async (req, res) => {
  const result = await db.run('INSERT INTO users (name, email, is_admin) VALUES ($1, $2, $3) RETURNING id', [req.body.name, req.body.email, req.body.admin]);
  await db.run('UPDATE users SET is_deleted = false WHERE id = $1', [result.lastID]);
  res.status(201).json({ id: result.lastID });
});
"#;

fn convert(text: &str) -> Conversion {
    Converter::default().convert(text)
}

#[test]
fn test_routes_file() {
    let out = convert(ROUTES_JS);
    assert_eq!(out.text, ROUTES_PG);
    assert!(out.result.changed);
    assert_eq!(out.result.placeholders, 7);
    assert_eq!(out.result.functions, 2);
    assert_eq!(out.result.booleans, 3);
    assert_eq!(out.result.returning, 1);
    assert!(out.result.conditions.is_empty());
}

#[test]
fn test_idempotence() {
    let once = convert(ROUTES_JS);
    let twice = convert(&once.text);
    assert_eq!(twice.text, once.text);
    assert_eq!(twice.result, ConversionResult::default());
}

#[test]
fn test_placeholder_order_preserved() {
    let out = convert("db.run('UPDATE t SET a = ?, b = ?, c = ? WHERE d = ? AND e = ?')");
    assert_eq!(
        out.text,
        "db.run('UPDATE t SET a = $1, b = $2, c = $3 WHERE d = $4 AND e = $5')"
    );
    assert_eq!(out.result.placeholders, 5);
}

#[test]
fn test_literal_boundaries_respected() {
    let src = "const pick = ready ? a : b; db.get('SELECT ?', [x ? y : z]);";
    let out = convert(src);
    assert_eq!(
        out.text,
        "const pick = ready ? a : b; db.get('SELECT $1', [x ? y : z]);"
    );
    assert_eq!(out.result.placeholders, 1);
}

#[test]
fn test_booleans_are_conservative() {
    let src = "LIMIT 1 OFFSET 0; SET count = 1; [count, 1]; [is_active, 1, 0]; \
               is_active = 12; is_active <> 1; total = is_paid + 1";
    let out = convert(src);
    assert_eq!(out.text, src);
    assert_eq!(out.result.booleans, 0);
    assert!(!out.result.changed);
}

#[test]
fn test_returning_added_once() {
    let mut text = "db.run('INSERT INTO users (name) VALUES (?)', [name])".to_string();
    for _ in 0..3 {
        text = convert(&text).text;
    }
    assert_eq!(
        text,
        "db.run('INSERT INTO users (name) VALUES ($1) RETURNING id', [name])"
    );
    assert_eq!(text.matches("RETURNING").count(), 1);
}

#[test]
fn test_host_strings_left_alone() {
    let src = "res.redirect('/login?next=' + encodeURIComponent(url));\n\
               if (!confirm(\"Discard this draft?\")) return;\n\
               const body = text.replace(/```json\\n?/g, '').replace(/```/g, '');\n\
               const flag = a + b ? 1 : 0;\n";
    let out = convert(src);
    assert_eq!(out.text, src);
    assert_eq!(out.result, ConversionResult::default());
}

#[test]
fn test_interval_keeps_single_quoted_literal_intact() {
    let src = r#"db.all('SELECT * FROM t WHERE d > datetime("now", "+7 days") AND a = ?', [a])"#;
    let once = convert(src);
    assert_eq!(
        once.text,
        r"db.all('SELECT * FROM t WHERE d > CURRENT_TIMESTAMP + INTERVAL \'7 days\' AND a = $1', [a])"
    );
    assert_eq!(convert(&once.text).text, once.text);
}

#[test]
fn test_returning_in_next_literal_not_duplicated() {
    let src = "db.run('INSERT INTO t (a) VALUES (?) ' +\n  'RETURNING id', [a]);";
    let out = convert(src);
    assert_eq!(
        out.text,
        "db.run('INSERT INTO t (a) VALUES ($1) ' +\n  'RETURNING id', [a]);"
    );
    assert_eq!(out.text.matches("RETURNING").count(), 1);
    assert_eq!(out.result.returning, 0);
}

#[test]
fn test_scenario_placeholders() {
    let out = convert("db.query('SELECT * FROM t WHERE a=? AND b=?')");
    assert_eq!(out.text, "db.query('SELECT * FROM t WHERE a=$1 AND b=$2')");
}

#[test]
fn test_scenario_interval() {
    let out = convert("datetime('now', '+7 days')");
    assert_eq!(out.text, "CURRENT_TIMESTAMP + INTERVAL '7 days'");
    assert_eq!(out.result.functions, 1);
}

#[test]
fn test_scenario_boolean_pair() {
    assert_eq!(convert("[is_active, 1]").text, "[is_active, true]");
    assert_eq!(convert("[count, 1]").text, "[count, 1]");
}

#[test]
fn test_scenario_insert_returning() {
    let once = convert("db.run('INSERT INTO users (name) VALUES (?)')");
    assert_eq!(
        once.text,
        "db.run('INSERT INTO users (name) VALUES ($1) RETURNING id')"
    );
    let twice = convert(&once.text);
    assert_eq!(twice.text, once.text);
    assert!(!twice.result.changed);
}

#[test]
fn test_scenario_unterminated_literal() {
    let src = "db.run('UPDATE t SET a = ? WHERE id = ?, [a, id]);\nok('SELECT ?');";
    let out = convert(src);
    assert_eq!(
        out.text,
        "db.run('UPDATE t SET a = ? WHERE id = ?, [a, id]);\nok('SELECT $1');"
    );
    assert_eq!(out.result.conditions, vec![Condition::unterminated_literal(1)]);
    assert!(out.result.has(ConditionKind::UnterminatedLiteral));
}

#[test]
fn test_statement_scope_template_query() {
    let src = "const rows = await db.query(`\n  INSERT INTO audit (user_id, action, created_at)\n  VALUES (?, ?, datetime('now'))\n`, [id, action]);\n";

    let config = DialectConfig::default().with_literal_scope(LiteralScope::Statement);
    let out = Converter::new(config).unwrap().convert(src);
    assert_eq!(
        out.text,
        "const rows = await db.query(`\n  INSERT INTO audit (user_id, action, created_at)\n  VALUES ($1, $2, CURRENT_TIMESTAMP) RETURNING id\n`, [id, action]);\n"
    );
    assert!(out.result.conditions.is_empty());

    let line_scoped = convert(src);
    assert!(line_scoped.text.contains("VALUES (?, ?, CURRENT_TIMESTAMP) RETURNING id"));
    assert!(line_scoped.result.has(ConditionKind::UnterminatedLiteral));
}

#[test]
fn test_custom_boolean_fields_from_toml() {
    let config = Config::from_toml(
        r#"
        [dialect]
        boolean_fields = ["is_verified"]
        "#,
    )
    .unwrap();
    let converter = Converter::new(config.dialect).unwrap();

    let out = converter.convert("UPDATE u SET is_verified = 1, is_active = 1");
    assert_eq!(out.text, "UPDATE u SET is_verified = true, is_active = 1");
}
