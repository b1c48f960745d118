use super::helpers::*;
use chandra_compiler::ast::{Block, Stmt};

// ---- Local storage identity ----

#[test]
fn test_two_reads_same_storage() {
    // local x = 4; return x, x
    let results = run_stmts(vec![
        local(&["x"], vec![num(4.0)]),
        ret(vec![name("x"), name("x")]),
    ]);
    assert_num(&results, 0, 4.0);
    assert_num(&results, 1, 4.0);
}

#[test]
fn test_redefinition_shadows_going_forward() {
    // local x = 1; local x = x + 1; return x
    let results = run_stmts(vec![
        local(&["x"], vec![num(1.0)]),
        local(&["x"], vec![add(name("x"), num(1.0))]),
        ret(vec![name("x")]),
    ]);
    assert_num(&results, 0, 2.0);
}

// ---- Shadowing across blocks ----

#[test]
fn test_inner_block_shadow_does_not_alias_outer() {
    // local x = 1; do local x = 2; x = 3 end; return x
    let results = run_stmts(vec![
        local(&["x"], vec![num(1.0)]),
        Stmt::Do(Block::new(vec![
            local(&["x"], vec![num(2.0)]),
            assign(vec![name("x")], vec![num(3.0)]),
        ])),
        ret(vec![name("x")]),
    ]);
    assert_num(&results, 0, 1.0);
}

#[test]
fn test_outer_binding_visible_after_block() {
    // local x = 7; do local x = 8 end; return x
    let results = run_stmts(vec![
        local(&["x"], vec![num(7.0)]),
        Stmt::Do(Block::new(vec![local(&["x"], vec![num(8.0)])])),
        ret(vec![name("x")]),
    ]);
    assert_num(&results, 0, 7.0);
}

#[test]
fn test_block_local_not_visible_outside() {
    // do local y = 1 end; return y   -- y resolves as a (nil) global
    let results = run_stmts(vec![
        Stmt::Do(Block::new(vec![local(&["y"], vec![num(1.0)])])),
        ret(vec![name("y")]),
    ]);
    assert_nil(&results, 0);
}

// ---- Declaration order ----

#[test]
fn test_local_init_reads_outer_binding() {
    // x = 5 (global); local x = x + 1; return x
    let results = run_stmts(vec![
        assign(vec![name("x")], vec![num(5.0)]),
        local(&["x"], vec![add(name("x"), num(1.0))]),
        ret(vec![name("x")]),
    ]);
    assert_num(&results, 0, 6.0);
}

// ---- Globals ----

#[test]
fn test_global_read_write() {
    // g = 11; return g
    let results = run_stmts(vec![
        assign(vec![name("g")], vec![num(11.0)]),
        ret(vec![name("g")]),
    ]);
    assert_num(&results, 0, 11.0);
}

#[test]
fn test_globals_persist_in_environment() {
    let s = sim();
    let chunk = compile_chunk(
        &[],
        chandra_compiler::ast::FuncInfo::leaf(),
        vec![assign(vec![name("shared")], vec![num(3.0)])],
    );
    run_chunk(&chunk, &s.env, &[]);
    assert_eq!(
        s.env.get_global("shared").unwrap(),
        chandra_core::value::Value::Number(3.0)
    );
}
