use rpal::value::Value;
use std::rc::Rc;

fn eval(src: &str) -> (Value, bool) {
    rpal::interpret(src).expect("program should evaluate without error")
}

#[test]
fn let_binding_and_arithmetic() {
    let (v, printed) = eval("let x = 5 in x + 3");
    assert_eq!(v, Value::Int(8));
    assert!(!printed);
}

#[test]
fn recursive_factorial_via_rec() {
    let (v, _) = eval("let rec fact n = n eq 0 -> 1 | n * fact(n - 1) in fact 5");
    assert_eq!(v, Value::Int(120));
}

#[test]
fn print_of_a_tuple_sets_the_output_and_the_result() {
    let (v, printed) = eval("let Pairs = (1,2,3) in Print(Pairs)");
    assert!(printed);
    assert_eq!(v, Value::Tuple(Rc::new(vec![Value::Int(1), Value::Int(2), Value::Int(3)])));
}

#[test]
fn multi_parameter_function_definition() {
    let (v, _) = eval("let f x y = x - y in f 10 3");
    assert_eq!(v, Value::Int(7));
}

#[test]
fn and_binds_simultaneously() {
    let (v, _) = eval("let x = 3 and y = 4 in x**2 + y**2");
    assert_eq!(v, Value::Int(25));
}

#[test]
fn conc_joins_two_strings() {
    let (v, _) = eval("'Hello' @ Conc ' World'");
    assert_eq!(v, Value::Str(Rc::from("Hello World")));
}

#[test]
fn where_clause_is_equivalent_to_let() {
    let (a, _) = eval("x + 1 where x = 41");
    let (b, _) = eval("let x = 41 in x + 1");
    assert_eq!(a, b);
}

#[test]
fn within_chains_two_definitions() {
    let (v, _) = eval("let a = 1 within b = a + 1 in b + 10");
    assert_eq!(v, Value::Int(12));
}

#[test]
fn order_counts_tuple_components_end_to_end() {
    let (v, _) = eval("Order (1, 2, 3, 4)");
    assert_eq!(v, Value::Int(4));
}

#[test]
fn stem_and_stern_are_inverse_to_conc() {
    let (v, _) = eval("let s = 'hello' in Stem(s) @ Conc Stern(s)");
    assert_eq!(v, Value::Str(Rc::from("hello")));
}

#[test]
fn undefined_identifier_surfaces_as_an_error() {
    assert!(rpal::interpret("undefined_name + 1").is_err());
}

#[test]
fn division_by_zero_surfaces_as_an_error() {
    assert!(rpal::interpret("1 / 0").is_err());
}

#[test]
fn tuple_used_as_a_function_selects_a_component() {
    let (v, _) = eval("let t = (10, 20, 30) in t 2");
    assert_eq!(v, Value::Int(20));
}
