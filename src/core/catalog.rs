use crate::domain::model::{Country, Named, Service, ServiceCategory};

pub const WHATSAPP_CONTACT: &str = "447598691673";

const fn service(
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    price: u32,
    price_usd: u32,
    category: ServiceCategory,
) -> Service {
    Service {
        id,
        name,
        icon,
        price,
        price_usd,
        category,
    }
}

const fn country(
    code: &'static str,
    name: &'static str,
    dial_code: &'static str,
    flag: &'static str,
) -> Country {
    Country {
        code,
        name,
        dial_code,
        flag,
    }
}

// KES 為主要定價（最低 2000），USD 約為 KES / 130 取整
pub static SERVICES: &[Service] = &[
    service("wa", "WhatsApp", "whatsapp", 2500, 19, ServiceCategory::Messenger),
    service("tg", "Telegram", "telegram", 2200, 17, ServiceCategory::Messenger),
    service("ig", "Instagram", "instagram", 2000, 15, ServiceCategory::Social),
    service("fb", "Facebook", "facebook", 2000, 15, ServiceCategory::Social),
    service("goo", "Google", "google", 2800, 22, ServiceCategory::Other),
    service("tt", "TikTok", "tiktok", 2000, 15, ServiceCategory::Social),
    service("tw", "Twitter/X", "twitter", 2100, 16, ServiceCategory::Social),
    service("li", "LinkedIn", "linkedin", 2400, 18, ServiceCategory::Social),
    service("pp", "PayPal", "paypal", 3000, 23, ServiceCategory::Other),
    service("airbnb", "Airbnb", "airbnb", 2200, 17, ServiceCategory::Other),
    service("bolt", "Bolt", "bolt", 2000, 15, ServiceCategory::Other),
];

// 第一筆（Kenya）為預設國家
pub static COUNTRIES: &[Country] = &[
    country("KE", "Kenya", "+254", "🇰🇪"),
    country("US", "United States", "+1", "🇺🇸"),
    country("GB", "United Kingdom", "+44", "🇬🇧"),
    country("CA", "Canada", "+1", "🇨🇦"),
    country("ZA", "South Africa", "+27", "🇿🇦"),
    country("AE", "UAE", "+971", "🇦🇪"),
    country("CN", "China", "+86", "🇨🇳"),
    country("DE", "Germany", "+49", "🇩🇪"),
    country("IN", "India", "+91", "🇮🇳"),
    country("NG", "Nigeria", "+234", "🇳🇬"),
    country("AU", "Australia", "+61", "🇦🇺"),
    country("FR", "France", "+33", "🇫🇷"),
    country("NL", "Netherlands", "+31", "🇳🇱"),
    country("BR", "Brazil", "+55", "🇧🇷"),
    country("RU", "Russia", "+7", "🇷🇺"),
    country("TZ", "Tanzania", "+255", "🇹🇿"),
    country("UG", "Uganda", "+256", "🇺🇬"),
    country("SA", "Saudi Arabia", "+966", "🇸🇦"),
    country("QA", "Qatar", "+974", "🇶🇦"),
    country("JP", "Japan", "+81", "🇯🇵"),
    country("KR", "South Korea", "+82", "🇰🇷"),
    country("SG", "Singapore", "+65", "🇸🇬"),
    country("TR", "Turkey", "+90", "🇹🇷"),
    country("ES", "Spain", "+34", "🇪🇸"),
    country("IT", "Italy", "+39", "🇮🇹"),
    country("SE", "Sweden", "+46", "🇸🇪"),
    country("CH", "Switzerland", "+41", "🇨🇭"),
    country("PL", "Poland", "+48", "🇵🇱"),
    country("ID", "Indonesia", "+62", "🇮🇩"),
    country("PH", "Philippines", "+63", "🇵🇭"),
];

/// 名稱包含 `query`（不分大小寫）的項目；空查詢回傳全部
pub fn filter<'a, T: Named>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.display_name().to_lowercase().contains(&needle))
        .collect()
}

pub fn find_service(id: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|s| s.id == id)
}

/// 以 ISO 國碼查找（不分大小寫）
pub fn find_country(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// 後端 `country_id` 可能是國碼或撥號前綴
pub fn find_country_for_order(country_id: &str) -> Option<&'static Country> {
    COUNTRIES
        .iter()
        .find(|c| c.code == country_id || c.dial_code == country_id)
}

/// CLI 輸入：先比對 id，再比對完整名稱
pub fn resolve_service(input: &str) -> Option<&'static Service> {
    find_service(input).or_else(|| {
        SERVICES
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(input.trim()))
    })
}

pub fn resolve_country(input: &str) -> Option<&'static Country> {
    find_country(input).or_else(|| {
        COUNTRIES
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(input.trim()))
    })
}

pub fn default_country() -> &'static Country {
    &COUNTRIES[0]
}
