use crate::core::currency::order_price_text;
use crate::domain::model::{Country, Currency, Service};
use url::form_urlencoded;

const WHATSAPP_BASE: &str = "https://wa.me";

/// 人工下單流程的訊息本文
pub fn order_message(service: &Service, country: &Country, currency: Currency) -> String {
    format!(
        "Hello, I would like to buy a verification number.\n\nService: {}\nCountry: {}\nPrice: {}",
        service.name,
        country.name,
        order_price_text(service, currency)
    )
}

/// `https://wa.me/<contact>?text=<encoded>`
pub fn order_link(contact: &str, service: &Service, country: &Country, currency: Currency) -> String {
    message_link(contact, &order_message(service, country, currency))
}

pub fn contact_link(contact: &str) -> String {
    format!("{}/{}", WHATSAPP_BASE, contact)
}

/// 配額/白名單錯誤時聯絡管理員，附上使用者名稱
pub fn admin_contact_link(contact: &str, username: &str) -> String {
    message_link(
        contact,
        &format!(
            "Hello, I would like to increase my number limit. My username is {}",
            username
        ),
    )
}

fn message_link(contact: &str, text: &str) -> String {
    format!("{}/{}?text={}", WHATSAPP_BASE, contact, encode_text(text))
}

// form 編碼把空白轉成 '+'；原本的 '+' 已被編成 %2B，因此可安全替換
fn encode_text(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
