use super::*;
use crate::parser::parse_source;

fn run_with_console(source: &str, console: MockConsole) -> (Result<(), RuntimeError>, String) {
    let output = console.output();
    let mut interpreter = Interpreter::with_console(Box::new(console));
    let program = parse_source(source).expect("parse failed");
    let result = interpreter.execute(&program);
    let text = output.borrow().clone();
    (result, text)
}

fn run(source: &str) -> (Result<(), RuntimeError>, String) {
    run_with_console(source, MockConsole::new())
}

fn run_ok(source: &str) -> String {
    let (result, output) = run(source);
    result.expect("execution failed");
    output
}

fn run_err(source: &str) -> RuntimeError {
    let (result, _) = run(source);
    result.expect_err("execution unexpectedly succeeded")
}

#[test]
fn arithmetic_and_inference() {
    assert_eq!(run_ok("x = 2 + 3 * 4;\nprintln(x);\n"), "14\n");
}

#[test]
fn integer_arithmetic_stays_integral() {
    assert_eq!(run_ok("println(1 + 2);\n"), "3\n");
    assert_eq!(run_ok("println(10 - 3);\n"), "7\n");
    // * / % ^ use float arithmetic
    assert_eq!(run_ok("println(7 / 2);\n"), "3.5\n");
    assert_eq!(run_ok("println(7 % 2);\n"), "1\n");
    assert_eq!(run_ok("println(2 ^ 10);\n"), "1024\n");
}

#[test]
fn integer_overflow_promotes_to_float() {
    // The promoted float prints with 15 significant digits.
    let output = run_ok("x = 9223372036854775807;\nx += 1;\nprintln(x);\n");
    assert_eq!(output, "9223372036854780000\n");
}

#[test]
fn unary_operators() {
    assert_eq!(run_ok("println(-5);\n"), "-5\n");
    assert_eq!(run_ok("println(+5);\n"), "5\n");
    assert_eq!(run_ok("println(!true);\n"), "false\n");
    assert_eq!(run_ok("println(!0);\n"), "true\n");
    assert_eq!(run_ok("x = -2.5;\nprintln(-x);\n"), "2.5\n");
}

#[test]
fn string_concatenation_uses_canonical_forms() {
    assert_eq!(run_ok("println(\"n=\" + 42);\n"), "n=42\n");
    assert_eq!(run_ok("println(1 + \"x\");\n"), "1x\n");
    assert_eq!(run_ok("println(\"v: \" + [1, \"a\"]);\n"), "v: [1, \"a\"]\n");
}

#[test]
fn equality_matrix() {
    assert_eq!(run_ok("println(2 == 2.0);\n"), "true\n");
    assert_eq!(run_ok("println(\"5\" == 5);\n"), "true\n");
    assert_eq!(run_ok("println(true == 1);\n"), "true\n");
    assert_eq!(run_ok("println([1, 2] == [1, 2]);\n"), "true\n");
    assert_eq!(run_ok("println([1, 2] != [2, 1]);\n"), "true\n");
    assert_eq!(
        run_ok("a = { k: 1 };\nb = { k: 1 };\nprintln(a == b);\n"),
        "true\n"
    );
    assert_eq!(run_ok("println(0.5 == \"0.5\");\n"), "true\n");
}

#[test]
fn logical_operators_evaluate_both_sides() {
    assert_eq!(run_ok("println(true && false);\n"), "false\n");
    assert_eq!(run_ok("println(false || 1);\n"), "true\n");

    // No short-circuit: the right operand is evaluated regardless.
    let error = run_err("x = false && missing;\n");
    assert_eq!(error.kind, ErrorKind::Name);
}

#[test]
fn typed_slot_accepts_and_coerces() {
    assert_eq!(run_ok("long a = 100;\na += 50;\nprintln(a);\n"), "150\n");
    // Numeric strings coerce on typed slots; the stored value is an integer.
    assert_eq!(run_ok("byte b = \"12\";\nprintln(b + 1);\n"), "13\n");
}

#[test]
fn typed_slot_range_errors() {
    let error = run_err("long a = 99999999999999999999;\n");
    assert_eq!(error.kind, ErrorKind::Range);

    let error = run_err("byte b = 256;\n");
    assert_eq!(error.kind, ErrorKind::Range);

    let error = run_err("byte b = 10;\nb -= 11;\n");
    assert_eq!(error.kind, ErrorKind::Range);

    let error = run_err("byte b = 10;\nb += 250;\n");
    assert_eq!(error.kind, ErrorKind::Range);
}

#[test]
fn typed_slot_type_errors() {
    let error = run_err("long a = \"not a number\";\n");
    assert_eq!(error.kind, ErrorKind::Type);

    // The kind sticks to the slot: later assignments still coerce.
    let error = run_err("long a = 1;\na = [1, 2];\n");
    assert_eq!(error.kind, ErrorKind::Type);
}

#[test]
fn byte_slot_never_leaves_its_range() {
    let output = run_ok(
        "byte b = 0;\nb += 255;\nprintln(b);\nb -= 255;\nprintln(b);\n",
    );
    assert_eq!(output, "255\n0\n");
}

#[test]
fn by_reference_parameters_write_back() {
    let source = "\
func bump(&v):
    v += 1;
endfunc
n = 10;
bump(n);
println(n);
";
    assert_eq!(run_ok(source), "11\n");
}

#[test]
fn by_reference_requires_a_plain_variable() {
    let source = "\
func bump(&v):
    v += 1;
endfunc
bump(10);
";
    let error = run_err(source);
    assert_eq!(error.kind, ErrorKind::Reference);

    let source = "\
func bump(&v):
    v += 1;
endfunc
bump(missing);
";
    assert_eq!(run_err(source).kind, ErrorKind::Reference);

    let source = "\
func take(v):
    v += 1;
endfunc
n = 1;
take(&n);
";
    assert_eq!(run_err(source).kind, ErrorKind::Reference);
}

#[test]
fn by_value_arguments_do_not_leak_back() {
    let source = "\
func grow(xs):
    xs[0] = 99;
endfunc
values = [1, 2];
grow(values);
println(values);
";
    assert_eq!(run_ok(source), "[1, 2]\n");
}

#[test]
fn reference_slots_carry_their_declaration_kind() {
    let source = "\
func clamp(&b):
    b += 300;
endfunc
byte b = 10;
clamp(b);
";
    // The callee's copy keeps the byte kind, so the mutation range-checks.
    assert_eq!(run_err(source).kind, ErrorKind::Range);
}

#[test]
fn functions_see_caller_variables() {
    let source = "\
base = 10;
func offset(n):
    return base + n;
endfunc
println(offset(5));
";
    assert_eq!(run_ok(source), "15\n");
}

#[test]
fn function_arity_is_exact() {
    let source = "\
func add(a, b):
    return a + b;
endfunc
add(1);
";
    assert_eq!(run_err(source).kind, ErrorKind::Arity);
}

#[test]
fn redeclaring_a_function_overwrites_it() {
    let source = "\
func f():
    return 1;
endfunc
func f():
    return 2;
endfunc
println(f());
";
    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn missing_return_in_expression_position_fails() {
    let source = "\
func noop():
    x = 1;
endfunc
y = noop();
";
    let error = run_err(source);
    assert_eq!(error.kind, ErrorKind::Type);
    assert!(error.message.contains("did not return"));
}

#[test]
fn bare_call_statements_tolerate_missing_returns() {
    let source = "\
func noop():
    x = 1;
endfunc
noop();
println(\"done\");
";
    assert_eq!(run_ok(source), "done\n");
}

#[test]
fn return_outside_a_function_is_rejected() {
    let error = run_err("return 1;\n");
    assert_eq!(error.kind, ErrorKind::ReturnContext);
}

#[test]
fn return_short_circuits_blocks_and_loops() {
    let source = "\
func first(xs):
    i = 0;
    while i < 100:
        if xs[i] > 10:
            return xs[i];
        endif
        i += 1;
    endwhile
    return -1;
endfunc
println(first([1, 50, 99]));
";
    assert_eq!(run_ok(source), "50\n");
}

#[test]
fn while_loops_re_evaluate_their_condition() {
    let source = "\
i = 0;
while i < 3:
    println(i);
    i += 1;
endwhile
";
    assert_eq!(run_ok(source), "0\n1\n2\n");
}

#[test]
fn print_does_not_append_a_newline() {
    assert_eq!(run_ok("print(1);\nprint(2);\nprintln(3);\n"), "123\n");
}

#[test]
fn list_literals_and_reads() {
    assert_eq!(run_ok("xs = [10, 20, 30];\nprintln(xs[1]);\n"), "20\n");
    assert_eq!(run_ok("xs = [[1, 2], [3]];\nprintln(xs[0][1]);\n"), "2\n");
}

#[test]
fn list_mutation_and_bounds() {
    assert_eq!(
        run_ok("xs = [10, 20, 30];\nxs[1] = 99;\nprintln(xs);\n"),
        "[10, 99, 30]\n"
    );

    let error = run_err("xs = [10, 20, 30];\nxs[5] = 0;\n");
    assert_eq!(error.kind, ErrorKind::Range);

    let error = run_err("xs = [10, 20, 30];\nprintln(xs[3]);\n");
    assert_eq!(error.kind, ErrorKind::Range);

    let error = run_err("xs = [1];\nxs[-1] = 0;\n");
    assert_eq!(error.kind, ErrorKind::Range);
}

#[test]
fn index_requires_a_list_and_an_integer() {
    assert_eq!(run_err("x = 5;\nprintln(x[0]);\n").kind, ErrorKind::Type);
    assert_eq!(run_err("x = 5;\nx[0] = 1;\n").kind, ErrorKind::Type);
    assert_eq!(
        run_err("xs = [1, 2];\nprintln(xs[0.5]);\n").kind,
        ErrorKind::Type
    );
}

#[test]
fn compound_list_mutation() {
    assert_eq!(
        run_ok("xs = [1, 2, 3];\nxs[2] += 10;\nprintln(xs);\n"),
        "[1, 2, 13]\n"
    );
}

#[test]
fn object_literals_and_property_paths() {
    let source = "user = { name: \"ada\", age: 30 };\nuser.age += 1;\nprintln(user);\n";
    assert_eq!(run_ok(source), "{name: \"ada\", age: 31}\n");

    assert_eq!(
        run_ok("user = { name: \"ada\" };\nprintln(user.name);\n"),
        "ada\n"
    );
}

#[test]
fn nested_object_paths() {
    let source = "\
config = { server: { port: 80 } };
config.server.port = 8080;
println(config.server.port);
";
    assert_eq!(run_ok(source), "8080\n");
}

#[test]
fn only_the_final_property_may_be_created_and_only_by_assignment() {
    assert_eq!(
        run_ok("user = { name: \"ada\" };\nuser.age = 30;\nprintln(user);\n"),
        "{name: \"ada\", age: 30}\n"
    );

    // Compound assignment needs an existing property.
    let error = run_err("user = { name: \"ada\" };\nuser.age += 1;\n");
    assert_eq!(error.kind, ErrorKind::Name);

    // Interior segments must already exist even for plain assignment.
    let error = run_err("user = { name: \"ada\" };\nuser.home.city = \"x\";\n");
    assert_eq!(error.kind, ErrorKind::Name);
}

#[test]
fn property_access_on_non_objects_is_a_type_error() {
    let error = run_err("x = 5;\nx.field = 1;\n");
    assert_eq!(error.kind, ErrorKind::Type);
}

#[test]
fn missing_property_reads_are_name_errors() {
    let error = run_err("user = { name: \"ada\" };\nprintln(user.age);\n");
    assert_eq!(error.kind, ErrorKind::Name);
    assert!(error.message.contains("age"));
}

#[test]
fn try_catch_captures_the_canonical_message() {
    let source = "\
try:
    x = y + 1;
catch(err):
    println(\"caught: \" + err);
endtry
";
    let output = run_ok(source);
    assert_eq!(output, "caught: NameError: undefined variable: y\n");
}

#[test]
fn try_without_error_skips_the_catch() {
    let source = "\
try:
    println(\"ok\");
catch(err):
    println(\"caught\");
endtry
";
    assert_eq!(run_ok(source), "ok\n");
}

#[test]
fn catch_binding_is_scoped_to_the_catch_block() {
    let source = "\
err = \"before\";
try:
    x = y;
catch(err):
    println(err);
endtry
println(err);
";
    let output = run_ok(source);
    assert_eq!(output, "NameError: undefined variable: y\nbefore\n");

    // Without a prior binding the name disappears again after the catch.
    let source = "\
try:
    x = y;
catch(err):
    println(\"in catch\");
endtry
println(err);
";
    assert_eq!(run_err(source).kind, ErrorKind::Name);
}

#[test]
fn errors_in_the_catch_block_propagate() {
    let source = "\
try:
    x = y;
catch(err):
    z = also_missing;
endtry
";
    assert_eq!(run_err(source).kind, ErrorKind::Name);
}

#[test]
fn uncaught_errors_abort_execution() {
    let source = "println(\"first\");\nx = missing;\nprintln(\"unreachable\");\n";
    let (result, output) = run(source);
    assert!(result.is_err());
    assert_eq!(output, "first\n");
}

#[test]
fn return_inside_try_reaches_the_caller() {
    let source = "\
func pick():
    try:
        return 42;
    catch(err):
        return 0;
    endtry
endfunc
println(pick());
";
    assert_eq!(run_ok(source), "42\n");
}

#[test]
fn catch_works_inside_functions() {
    let source = "\
func safe_read(obj):
    try:
        return obj.missing;
    catch(err):
        return \"fallback\";
    endtry
endfunc
println(safe_read({ present: 1 }));
";
    assert_eq!(run_ok(source), "fallback\n");
}

#[test]
fn sum_requires_the_math_import() {
    assert_eq!(run_ok("import math;\nprintln(sum(2, 3));\n"), "5\n");

    let error = run_err("println(sum(2, 3));\n");
    assert_eq!(error.kind, ErrorKind::Name);
    assert!(error.message.contains("sum"));
}

#[test]
fn sum_arity_and_operands() {
    let error = run_err("import math;\nprintln(sum(2));\n");
    assert_eq!(error.kind, ErrorKind::Arity);

    let error = run_err("import math;\nprintln(sum(2, [1]));\n");
    assert_eq!(error.kind, ErrorKind::Type);
}

#[test]
fn input_reads_from_the_console() {
    let console = MockConsole::with_input(&["ada"]);
    let (result, output) = run_with_console(
        "name = input(\"who? \");\nprintln(\"hi \" + name);\n",
        console,
    );
    result.unwrap();
    assert_eq!(output, "who? hi ada\n");
}

#[test]
fn input_at_end_of_input_returns_an_empty_string() {
    let (result, output) = run("x = input();\nprintln(x == \"\");\n");
    result.unwrap();
    assert_eq!(output, "true\n");
}

#[test]
fn printf_formats_and_returns_the_byte_count() {
    let source = "n = printf(\"%d-%s\", 7, \"x\");\nprintln(n);\n";
    let output = run_ok(source);
    assert_eq!(output, "7-x3\n");
}

#[test]
fn printf_argument_mismatch_is_an_arity_error() {
    let error = run_err("printf(\"%d %d\", 1);\n");
    assert_eq!(error.kind, ErrorKind::Arity);
}

#[test]
fn now_ms_returns_a_non_negative_integer() {
    assert_eq!(run_ok("t = now_ms();\nprintln(t > 0);\n"), "true\n");
}

#[test]
fn sleep_ms_validates_its_delay() {
    assert_eq!(run_ok("println(sleep_ms(0));\n"), "0\n");
    assert_eq!(run_err("sleep_ms(-1);\n").kind, ErrorKind::Range);
    assert_eq!(run_err("sleep_ms(\"soon\");\n").kind, ErrorKind::Type);
}

#[test]
fn async_read_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.txt");
    std::fs::write(&data, "payload").unwrap();

    let source = format!(
        "id = async_read_file(\"{}\");\nprintln(await(id));\n",
        data.display()
    );
    assert_eq!(run_ok(&source), "payload\n");
}

#[test]
fn task_ready_eventually_reports_completion() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.txt");
    std::fs::write(&data, "x").unwrap();

    let source = format!(
        "\
id = async_read_file(\"{}\");
while !task_ready(id):
    sleep_ms(1);
endwhile
println(await(id));
",
        data.display()
    );
    assert_eq!(run_ok(&source), "x\n");
}

#[test]
fn failed_tasks_surface_their_error_at_await() {
    let source = "id = async_read_file(\"/no/such/file.txt\");\nx = await(id);\n";
    assert_eq!(run_err(source).kind, ErrorKind::Io);

    // and the failure is catchable
    let source = "\
id = async_read_file(\"/no/such/file.txt\");
try:
    x = await(id);
catch(err):
    println(\"caught\");
endtry
";
    assert_eq!(run_ok(source), "caught\n");
}

#[test]
fn task_ids_are_validated_and_consumed() {
    assert_eq!(run_err("task_ready(99);\n").kind, ErrorKind::Name);
    assert_eq!(run_err("x = await(99);\n").kind, ErrorKind::Name);
    assert_eq!(run_err("task_ready(0);\n").kind, ErrorKind::Type);
    assert_eq!(run_err("task_ready(\"id\");\n").kind, ErrorKind::Type);

    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("d.txt");
    std::fs::write(&data, "x").unwrap();
    let source = format!(
        "id = async_read_file(\"{}\");\na = await(id);\nb = await(id);\n",
        data.display()
    );
    let (result, _) = run(&source);
    assert_eq!(result.unwrap_err().kind, ErrorKind::Name);
}

#[test]
fn file_builtins_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let path_text = path.display().to_string();

    let source = format!(
        "\
println(file_exists(\"{path}\"));
write_file(\"{path}\", \"one\");
append_file(\"{path}\", \"+two\");
println(read_file(\"{path}\"));
println(file_exists(\"{path}\"));
",
        path = path_text
    );
    assert_eq!(run_ok(&source), "false\none+two\ntrue\n");
}

#[test]
fn read_file_reports_missing_files() {
    let error = run_err("x = read_file(\"/no/such/file.txt\");\n");
    assert_eq!(error.kind, ErrorKind::Io);
}

#[test]
fn typed_declarations_do_not_apply_to_object_properties() {
    let error = run_err("user = { age: 1 };\nlong user.age = 2;\n");
    assert_eq!(error.kind, ErrorKind::Type);
}

#[test]
fn dynamic_slots_change_shape_freely() {
    let source = "x = 1;\nx = \"text\";\nx = [1];\nprintln(x);\n";
    assert_eq!(run_ok(source), "[1]\n");
}

#[test]
fn aggregates_copy_on_assignment() {
    let source = "\
a = [1, 2];
b = a;
b[0] = 99;
println(a);
println(b);
";
    assert_eq!(run_ok(source), "[1, 2]\n[99, 2]\n");
}

#[test]
fn module_import_executes_top_level_once() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("greeting.clot"), "println(\"loaded\");\n").unwrap();

    let console = MockConsole::new();
    let output = console.output();
    let mut interpreter = Interpreter::with_console(Box::new(console));
    interpreter.set_entry_file(&dir.path().join("main.clot"));

    let program = parse_source("import greeting;\nimport greeting;\n").unwrap();
    interpreter.execute(&program).unwrap();
    assert_eq!(*output.borrow(), "loaded\n");
}

#[test]
fn module_functions_survive_the_import() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("mathx.clot"),
        "func double(n):\n    return n * 2;\nendfunc\n",
    )
    .unwrap();

    let console = MockConsole::new();
    let output = console.output();
    let mut interpreter = Interpreter::with_console(Box::new(console));
    interpreter.set_entry_file(&dir.path().join("main.clot"));

    let program = parse_source("import mathx;\nprintln(double(21));\n").unwrap();
    interpreter.execute(&program).unwrap();
    assert_eq!(*output.borrow(), "42\n");
}

#[test]
fn circular_imports_are_detected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.clot"), "import b;\n").unwrap();
    std::fs::write(dir.path().join("b.clot"), "import a;\n").unwrap();

    let mut interpreter = Interpreter::with_console(Box::new(MockConsole::new()));
    interpreter.set_entry_file(&dir.path().join("main.clot"));

    let program = parse_source("import a;\n").unwrap();
    let error = interpreter.execute(&program).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Module);
    assert!(error.message.contains("circular import"));
}

#[test]
fn module_parse_errors_are_module_errors_with_position() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.clot"), "x = ;\n").unwrap();

    let mut interpreter = Interpreter::with_console(Box::new(MockConsole::new()));
    interpreter.set_entry_file(&dir.path().join("main.clot"));

    let program = parse_source("import broken;\n").unwrap();
    let error = interpreter.execute(&program).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Module);
    assert!(error.message.contains("broken"));
    assert!(error.message.contains("line 1"));
}

#[test]
fn missing_modules_are_module_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut interpreter = Interpreter::with_console(Box::new(MockConsole::new()));
    interpreter.set_entry_file(&dir.path().join("main.clot"));

    let program = parse_source("import nowhere;\n").unwrap();
    let error = interpreter.execute(&program).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Module);
}

#[test]
fn failed_module_loads_can_be_caught() {
    let dir = tempfile::tempdir().unwrap();
    let console = MockConsole::new();
    let output = console.output();
    let mut interpreter = Interpreter::with_console(Box::new(console));
    interpreter.set_entry_file(&dir.path().join("main.clot"));

    let program = parse_source(
        "try:\n    import nowhere;\ncatch(err):\n    println(\"caught\");\nendtry\n",
    )
    .unwrap();
    interpreter.execute(&program).unwrap();
    assert_eq!(*output.borrow(), "caught\n");
}

#[test]
fn execute_resets_interpreter_state() {
    let console = MockConsole::new();
    let output = console.output();
    let mut interpreter = Interpreter::with_console(Box::new(console));

    let program = parse_source("x = 1;\nprintln(x);\n").unwrap();
    interpreter.execute(&program).unwrap();

    // The second run must not see the first run's environment.
    let program = parse_source("println(x);\n").unwrap();
    let error = interpreter.execute(&program).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Name);
    assert_eq!(*output.borrow(), "1\n");
}

#[test]
fn canonical_output_is_deterministic() {
    // Numerically irrelevant operations do not change the string form.
    let direct = run_ok("println(1.5);\n");
    let noisy = run_ok("println(1.5 + 0);\n");
    assert_eq!(direct, noisy);
}
