use combot_llm::{Message, Role};
use serde_json::json;

#[test]
fn test_constructors_set_role() {
    assert_eq!(Message::system("Be brief").role, Role::System);
    assert_eq!(Message::user("My parcel is late").role, Role::User);
    assert_eq!(Message::assistant("When was it due?").role, Role::Assistant);
}

#[test]
fn test_message_wire_shape() {
    let value = serde_json::to_value(Message::user("Hello")).unwrap();
    assert_eq!(value, json!({"role": "user", "content": "Hello"}));

    let parsed: Message = serde_json::from_value(json!({"role": "assistant", "content": "Hi"})).unwrap();
    assert_eq!(parsed, Message::assistant("Hi"));
}

#[test]
fn test_unknown_role_is_rejected() {
    let parsed = serde_json::from_value::<Message>(json!({"role": "tool", "content": "x"}));
    assert!(parsed.is_err());
}

#[test]
fn test_role_display() {
    assert_eq!(Role::System.to_string(), "system");
    assert_eq!(Role::User.as_str(), "user");
}
