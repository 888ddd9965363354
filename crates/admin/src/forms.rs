//! Client-side validation of the admin create/edit forms.
//!
//! Forms hold raw input exactly as typed. `validate` checks every field and
//! returns either a typed payload ready to submit or a [`FormErrors`] with
//! one message per offending field, so the screen can flag all of them at
//! once.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use fastbite_core::{
    Banner, BannerPosition, BannerType, CategoryId, CurrencyCode, DiscountType, Product, Promotion,
};
use rust_decimal::Decimal;
use serde::Serialize;

const MAX_NAME_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 2000;
const COUPON_CODE_LEN: std::ops::RangeInclusive<usize> = 3..=20;

/// Field name to message, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first error per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Whether a form creates a record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// An image picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Upload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            content_type: content_type_for(&file_name),
            file_name,
            bytes,
        }
    }

    /// Read an image from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    fn check(&self, field: &'static str, max_bytes: u64, errors: &mut FormErrors) {
        if !self.content_type.starts_with("image/") {
            errors.add(field, "chỉ chấp nhận ảnh JPG, PNG, WEBP hoặc GIF");
        } else if self.bytes.is_empty() {
            errors.add(field, "tệp ảnh rỗng");
        } else if self.bytes.len() as u64 > max_bytes {
            errors.add(
                field,
                format!("ảnh vượt quá {} MB", max_bytes.div_ceil(1024 * 1024)),
            );
        }
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category_id: String,
    /// Comma separated.
    pub tags: String,
    pub is_vegetarian: bool,
    pub is_featured: bool,
    pub is_active: bool,
    pub image: Option<Upload>,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: String::new(),
            stock: "0".to_string(),
            category_id: String::new(),
            tags: String::new(),
            is_vegetarian: false,
            is_featured: false,
            is_active: true,
            image: None,
        }
    }
}

/// A validated product ready for multipart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    pub category_id: CategoryId,
    pub tags: Vec<String>,
    pub is_vegetarian: bool,
    pub is_featured: bool,
    pub is_active: bool,
    pub image: Option<Upload>,
}

impl ProductForm {
    /// Prefill the edit form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.normalize().to_string(),
            stock: product.stock.to_string(),
            category_id: product.category.id().to_string(),
            tags: product.tags.join(", "),
            is_vegetarian: product.is_vegetarian,
            is_featured: product.is_featured,
            is_active: product.is_active,
            image: None,
        }
    }

    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(
        &self,
        mode: FormMode,
        max_upload_bytes: u64,
        currency: CurrencyCode,
    ) -> Result<ProductPayload, FormErrors> {
        let mut errors = FormErrors::new();

        let name = required_text(&self.name, "name", MAX_NAME_CHARS, &mut errors);
        let description = self.description.trim().to_string();
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            errors.add(
                "description",
                format!("tối đa {MAX_DESCRIPTION_CHARS} ký tự"),
            );
        }

        let price = match parse_decimal(&self.price, Amount::Money(currency)) {
            Some(p) if p > Decimal::ZERO => p,
            Some(_) => {
                errors.add("price", "giá phải lớn hơn 0");
                Decimal::ZERO
            }
            None => {
                errors.add("price", "giá không hợp lệ");
                Decimal::ZERO
            }
        };

        let stock = self.stock.trim().parse::<u32>().unwrap_or_else(|_| {
            errors.add("stock", "tồn kho phải là số nguyên không âm");
            0
        });

        let category_id = self.category_id.trim();
        if category_id.is_empty() {
            errors.add("category", "vui lòng chọn danh mục");
        }

        check_image(self.image.as_ref(), mode, max_upload_bytes, &mut errors);

        errors.finish(|| ProductPayload {
            name,
            description,
            price,
            stock,
            category_id: CategoryId::new(category_id),
            tags: split_tags(&self.tags),
            is_vegetarian: self.is_vegetarian,
            is_featured: self.is_featured,
            is_active: self.is_active,
            image: self.image.clone(),
        })
    }
}

impl ProductPayload {
    /// Text parts of the multipart body.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("price", self.price.normalize().to_string()),
            ("stock", self.stock.to_string()),
            ("category", self.category_id.to_string()),
            ("tags", self.tags.join(",")),
            ("isVegetarian", self.is_vegetarian.to_string()),
            ("isFeatured", self.is_featured.to_string()),
            ("isActive", self.is_active.to_string()),
        ]
    }
}

// =============================================================================
// Banners
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerForm {
    pub title: String,
    pub subtitle: String,
    pub link: String,
    pub position: String,
    pub banner_type: String,
    pub background_color: String,
    pub text_color: String,
    pub start_date: String,
    pub end_date: String,
    pub display_order: String,
    pub is_active: bool,
    pub image: Option<Upload>,
}

impl Default for BannerForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            link: String::new(),
            position: BannerPosition::HomeHero.as_str().to_string(),
            banner_type: BannerType::Image.to_string(),
            background_color: String::new(),
            text_color: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            display_order: "0".to_string(),
            is_active: true,
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerPayload {
    pub title: String,
    pub subtitle: Option<String>,
    pub link: Option<String>,
    pub position: BannerPosition,
    pub banner_type: BannerType,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub display_order: i32,
    pub is_active: bool,
    pub image: Option<Upload>,
}

impl BannerForm {
    #[must_use]
    pub fn from_banner(banner: &Banner) -> Self {
        Self {
            title: banner.title.clone(),
            subtitle: banner.subtitle.clone().unwrap_or_default(),
            link: banner.link.clone().unwrap_or_default(),
            position: banner.position.as_str().to_string(),
            banner_type: banner.banner_type.to_string(),
            background_color: banner.background_color.clone().unwrap_or_default(),
            text_color: banner.text_color.clone().unwrap_or_default(),
            start_date: banner.start_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            end_date: banner.end_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            display_order: banner.display_order.to_string(),
            is_active: banner.is_active,
            image: None,
        }
    }

    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(&self, mode: FormMode, max_upload_bytes: u64) -> Result<BannerPayload, FormErrors> {
        let mut errors = FormErrors::new();

        let title = required_text(&self.title, "title", MAX_NAME_CHARS, &mut errors);

        let link = optional(&self.link);
        if let Some(link) = &link
            && !(link.starts_with('/') || link.starts_with("http://") || link.starts_with("https://"))
        {
            errors.add("link", "liên kết phải bắt đầu bằng / hoặc http(s)://");
        }

        let position = BannerPosition::from_str(self.position.trim()).unwrap_or_else(|_| {
            errors.add("position", "vị trí không hợp lệ");
            BannerPosition::HomeHero
        });
        let banner_type = BannerType::from_str(self.banner_type.trim()).unwrap_or_else(|_| {
            errors.add("type", "loại banner không hợp lệ");
            BannerType::Image
        });

        let background_color = optional(&self.background_color);
        if background_color.as_deref().is_some_and(|c| !is_hex_color(c)) {
            errors.add("backgroundColor", "màu phải có dạng #RGB hoặc #RRGGBB");
        }
        let text_color = optional(&self.text_color);
        if text_color.as_deref().is_some_and(|c| !is_hex_color(c)) {
            errors.add("textColor", "màu phải có dạng #RGB hoặc #RRGGBB");
        }

        let (start_date, end_date) =
            date_range(&self.start_date, &self.end_date, &mut errors);

        let display_order = if self.display_order.trim().is_empty() {
            0
        } else {
            self.display_order.trim().parse::<i32>().unwrap_or_else(|_| {
                errors.add("displayOrder", "thứ tự hiển thị phải là số nguyên");
                0
            })
        };

        if banner_type == BannerType::Image {
            check_image(self.image.as_ref(), mode, max_upload_bytes, &mut errors);
        } else if let Some(image) = &self.image {
            image.check("image", max_upload_bytes, &mut errors);
        }

        errors.finish(|| BannerPayload {
            title,
            subtitle: optional(&self.subtitle),
            link,
            position,
            banner_type,
            background_color,
            text_color,
            start_date,
            end_date,
            display_order,
            is_active: self.is_active,
            image: self.image.clone(),
        })
    }
}

impl BannerPayload {
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.title.clone()),
            ("position", self.position.as_str().to_string()),
            ("type", self.banner_type.to_string()),
            ("displayOrder", self.display_order.to_string()),
            ("isActive", self.is_active.to_string()),
        ];
        let optional = [
            ("subtitle", self.subtitle.clone()),
            ("link", self.link.clone()),
            ("backgroundColor", self.background_color.clone()),
            ("textColor", self.text_color.clone()),
            ("startDate", self.start_date.map(|d| d.to_rfc3339())),
            ("endDate", self.end_date.map(|d| d.to_rfc3339())),
        ];
        fields.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v))),
        );
        fields
    }
}

// =============================================================================
// Coupons
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponForm {
    pub code: String,
    pub name: String,
    pub description: String,
    pub discount_type: String,
    pub value: String,
    pub min_order_value: String,
    pub max_discount: String,
    pub usage_limit: String,
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
}

impl Default for CouponForm {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            description: String::new(),
            discount_type: "percentage".to_string(),
            value: String::new(),
            min_order_value: String::new(),
            max_discount: String::new(),
            usage_limit: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            is_active: true,
        }
    }
}

/// A validated coupon, sent as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPayload {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_order_value: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_discount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl CouponForm {
    #[must_use]
    pub fn from_promotion(promotion: &Promotion) -> Self {
        let decimal = |d: Option<Decimal>| d.map(|d| d.normalize().to_string()).unwrap_or_default();
        Self {
            code: promotion.code.clone(),
            name: promotion.name.clone().unwrap_or_default(),
            description: promotion.description.clone().unwrap_or_default(),
            discount_type: match promotion.discount_type {
                DiscountType::Percentage => "percentage".to_string(),
                DiscountType::Fixed => "fixed".to_string(),
            },
            value: promotion.value.normalize().to_string(),
            min_order_value: decimal(promotion.min_order_value),
            max_discount: decimal(promotion.max_discount),
            usage_limit: promotion.usage_limit.map(|l| l.to_string()).unwrap_or_default(),
            start_date: promotion.start_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            end_date: promotion.end_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            is_active: promotion.is_active,
        }
    }

    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(&self, currency: CurrencyCode) -> Result<CouponPayload, FormErrors> {
        let mut errors = FormErrors::new();

        let code = self.code.trim().to_uppercase();
        if !COUPON_CODE_LEN.contains(&code.chars().count()) {
            errors.add(
                "code",
                format!(
                    "mã phải dài {}-{} ký tự",
                    COUPON_CODE_LEN.start(),
                    COUPON_CODE_LEN.end()
                ),
            );
        } else if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            errors.add("code", "mã chỉ gồm chữ, số, '-' và '_'");
        }

        let discount_type = match self.discount_type.trim() {
            "percentage" => DiscountType::Percentage,
            "fixed" => DiscountType::Fixed,
            _ => {
                errors.add("discountType", "loại giảm giá không hợp lệ");
                DiscountType::Percentage
            }
        };

        let value_amount = match discount_type {
            DiscountType::Percentage => Amount::Plain,
            DiscountType::Fixed => Amount::Money(currency),
        };
        let value = match parse_decimal(&self.value, value_amount) {
            Some(v) if v <= Decimal::ZERO => {
                errors.add("value", "giá trị phải lớn hơn 0");
                v
            }
            Some(v) if discount_type == DiscountType::Percentage && v > Decimal::ONE_HUNDRED => {
                errors.add("value", "phần trăm giảm tối đa là 100");
                v
            }
            Some(v) => v,
            None => {
                errors.add("value", "giá trị không hợp lệ");
                Decimal::ZERO
            }
        };

        let money = Amount::Money(currency);
        let min_order_value =
            optional_decimal(&self.min_order_value, money, "minOrderValue", &mut errors);
        if min_order_value.is_some_and(|v| v < Decimal::ZERO) {
            errors.add("minOrderValue", "không được âm");
        }
        let max_discount = optional_decimal(&self.max_discount, money, "maxDiscount", &mut errors);
        if max_discount.is_some_and(|v| v <= Decimal::ZERO) {
            errors.add("maxDiscount", "phải lớn hơn 0");
        }

        let usage_limit = match optional(&self.usage_limit) {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n >= 1 => Some(n),
                _ => {
                    errors.add("usageLimit", "số lượt phải là số nguyên dương");
                    None
                }
            },
        };

        let (start_date, end_date) =
            date_range(&self.start_date, &self.end_date, &mut errors);

        errors.finish(|| CouponPayload {
            code,
            name: optional(&self.name),
            description: optional(&self.description),
            discount_type,
            value,
            min_order_value,
            max_discount,
            usage_limit,
            start_date,
            end_date,
            is_active: self.is_active,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn required_text(raw: &str, field: &'static str, max: usize, errors: &mut FormErrors) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, "không được để trống");
    } else if value.chars().count() > max {
        errors.add(field, format!("tối đa {max} ký tự"));
    }
    value.to_string()
}

fn optional(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// How a typed number is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Amount {
    /// Percentages and counts: a dot is the decimal point unless it can
    /// only be a thousands separator (`1.250.000`).
    Plain,
    /// Amounts in the shop currency. VND has no minor unit, so `45.000`
    /// reads as forty-five thousand; USD accepts `1,250.50`.
    Money(CurrencyCode),
}

fn parse_decimal(raw: &str, amount: Amount) -> Option<Decimal> {
    let raw = raw.trim().replace([' ', '_'], "");
    let (sign, body) = raw
        .strip_prefix('-')
        .map_or(("", raw.as_str()), |rest| ("-", rest));

    let normalized = match (thousands_groups(body, '.'), amount) {
        (Some(groups), _) if groups >= 2 => body.replace('.', ""),
        (Some(_), Amount::Money(CurrencyCode::VND)) => body.replace('.', ""),
        (_, Amount::Money(CurrencyCode::USD)) => {
            let (int, frac) = body.split_once('.').map_or((body, None), |(i, f)| (i, Some(f)));
            let int = if thousands_groups(int, ',').is_some() {
                int.replace(',', "")
            } else {
                int.to_string()
            };
            match frac {
                Some(frac) => format!("{int}.{frac}"),
                None => int,
            }
        }
        _ => body.to_string(),
    };
    Decimal::from_str(&format!("{sign}{normalized}")).ok()
}

/// Number of `sep`-led groups when `raw` is written as `1-3 digits` followed
/// by one or more `sep ddd` groups, without a leading zero.
fn thousands_groups(raw: &str, sep: char) -> Option<usize> {
    let mut parts = raw.split(sep);
    let head = parts.next()?;
    let head_ok = (1..=3).contains(&head.len())
        && !head.starts_with('0')
        && head.chars().all(|c| c.is_ascii_digit());
    let mut groups = 0;
    for group in parts {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        groups += 1;
    }
    (head_ok && groups > 0).then_some(groups)
}

fn optional_decimal(
    raw: &str,
    amount: Amount,
    field: &'static str,
    errors: &mut FormErrors,
) -> Option<Decimal> {
    let raw = optional(raw)?;
    parse_decimal(&raw, amount).or_else(|| {
        errors.add(field, "giá trị không hợp lệ");
        None
    })
}

/// RFC 3339, or a bare `YYYY-MM-DD`. A bare start date means the first
/// millisecond of that day (UTC), a bare end date the last one.
fn parse_date(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
            let time = if end_of_day {
                day.and_hms_milli_opt(23, 59, 59, 999)
            } else {
                day.and_hms_opt(0, 0, 0)
            };
            time.map(|d| d.and_utc())
        })
}

fn date_range(
    start: &str,
    end: &str,
    errors: &mut FormErrors,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let mut parse = |raw: &str, field: &'static str, end_of_day: bool| {
        optional(raw).and_then(|raw| {
            parse_date(&raw, end_of_day).or_else(|| {
                errors.add(field, "ngày không hợp lệ (YYYY-MM-DD)");
                None
            })
        })
    };
    let start_date = parse(start, "startDate", false);
    let end_date = parse(end, "endDate", true);

    if let (Some(s), Some(e)) = (start_date, end_date)
        && e <= s
    {
        errors.add("endDate", "ngày kết thúc phải sau ngày bắt đầu");
    }
    (start_date, end_date)
}

fn is_hex_color(raw: &str) -> bool {
    raw.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let tag = tag.to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn check_image(image: Option<&Upload>, mode: FormMode, max_bytes: u64, errors: &mut FormErrors) {
    match image {
        Some(upload) => upload.check("image", max_bytes, errors),
        None if mode == FormMode::Create => errors.add("image", "vui lòng chọn ảnh"),
        None => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MAX: u64 = 5 * 1024 * 1024;

    fn png() -> Upload {
        Upload::new("burger.PNG", vec![0x89, 0x50, 0x4e, 0x47])
    }

    #[test]
    fn test_product_form_collects_all_errors() {
        let form = ProductForm {
            name: "   ".to_string(),
            price: "-5".to_string(),
            stock: "mười".to_string(),
            ..ProductForm::default()
        };

        let errors = form.validate(FormMode::Create, MAX, CurrencyCode::VND).unwrap_err();
        assert_eq!(errors.len(), 5);
        for field in ["name", "price", "stock", "category", "image"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn test_product_form_valid() {
        let form = ProductForm {
            name: " Burger bò phô mai ".to_string(),
            price: "45.000".to_string(),
            stock: "20".to_string(),
            category_id: "c1".to_string(),
            tags: "Spicy, beef, spicy".to_string(),
            image: Some(png()),
            ..ProductForm::default()
        };

        let payload = form.validate(FormMode::Create, MAX, CurrencyCode::VND).unwrap();
        assert_eq!(payload.name, "Burger bò phô mai");
        assert_eq!(payload.price, Decimal::from(45_000));
        assert_eq!(payload.tags, vec!["spicy", "beef"]);
        assert_eq!(payload.image.unwrap().content_type, "image/png");
    }

    #[test]
    fn test_decimal_separators() {
        let vnd = Amount::Money(CurrencyCode::VND);
        let usd = Amount::Money(CurrencyCode::USD);

        assert_eq!(parse_decimal("4.5", Amount::Plain), Some(Decimal::new(45, 1)));
        assert_eq!(parse_decimal("4.500", Amount::Plain), Some(Decimal::new(45, 1)));
        assert_eq!(parse_decimal("1.250.000", Amount::Plain), Some(Decimal::from(1_250_000)));

        assert_eq!(parse_decimal("45.000", vnd), Some(Decimal::from(45_000)));
        assert_eq!(parse_decimal("0.500", vnd), Some(Decimal::new(5, 1)));
        assert_eq!(parse_decimal("-1.250.000", vnd), Some(Decimal::from(-1_250_000)));

        assert_eq!(parse_decimal("4.500", usd), Some(Decimal::new(45, 1)));
        assert_eq!(parse_decimal("1,250.50", usd), Some(Decimal::new(125_050, 2)));
        assert_eq!(parse_decimal("abc", vnd), None);
    }

    #[test]
    fn test_bare_end_date_covers_whole_day() {
        let mut errors = FormErrors::new();
        let (start, end) = date_range("2026-05-01", "2026-05-01", &mut errors);
        assert!(errors.is_empty());
        assert_eq!(start.unwrap().to_rfc3339(), "2026-05-01T00:00:00+00:00");
        assert_eq!(end.unwrap().to_rfc3339(), "2026-05-01T23:59:59.999+00:00");
    }

    #[test]
    fn test_percentage_coupon_reads_dot_as_decimal_point() {
        let form = CouponForm {
            code: "GIAM4".to_string(),
            value: "4.500".to_string(),
            ..CouponForm::default()
        };
        let payload = form.validate(CurrencyCode::VND).unwrap();
        assert_eq!(payload.value, Decimal::new(45, 1));
    }

    #[test]
    fn test_edit_does_not_require_image() {
        let form = ProductForm {
            name: "Pepsi".to_string(),
            price: "15000".to_string(),
            category_id: "c2".to_string(),
            ..ProductForm::default()
        };
        assert!(form.validate(FormMode::Edit, MAX, CurrencyCode::VND).is_ok());
    }

    #[test]
    fn test_upload_rules() {
        let mut errors = FormErrors::new();
        Upload::new("menu.pdf", vec![1]).check("image", MAX, &mut errors);
        assert!(errors.get("image").is_some());

        let mut errors = FormErrors::new();
        Upload::new("big.jpg", vec![0; 11]).check("image", 10, &mut errors);
        assert!(errors.get("image").is_some());
    }

    #[tokio::test]
    async fn test_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Combo-Gia-Dinh.WEBP");
        std::fs::write(&path, b"RIFF0000WEBP").unwrap();

        let upload = Upload::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name, "Combo-Gia-Dinh.WEBP");
        assert_eq!(upload.content_type, "image/webp");
        assert_eq!(upload.bytes.len(), 12);

        assert!(Upload::from_path(&dir.path().join("missing.png")).await.is_err());
    }

    #[test]
    fn test_banner_form_rules() {
        let form = BannerForm {
            title: "Combo trưa".to_string(),
            link: "javascript:alert(1)".to_string(),
            position: "footer".to_string(),
            background_color: "red".to_string(),
            start_date: "2026-05-10".to_string(),
            end_date: "2026-05-01".to_string(),
            image: Some(png()),
            ..BannerForm::default()
        };

        let errors = form.validate(FormMode::Create, MAX).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|(f, _)| f).collect();
        assert_eq!(
            fields,
            vec!["backgroundColor", "endDate", "link", "position"]
        );
    }

    #[test]
    fn test_text_banner_needs_no_image() {
        let form = BannerForm {
            title: "Freeship cuối tuần".to_string(),
            banner_type: "text".to_string(),
            text_color: "#fff".to_string(),
            ..BannerForm::default()
        };
        let payload = form.validate(FormMode::Create, MAX).unwrap();
        assert_eq!(payload.banner_type, BannerType::Text);
        assert!(payload.fields().contains(&("textColor", "#fff".to_string())));
    }

    #[test]
    fn test_coupon_form_rules() {
        let form = CouponForm {
            code: "x".to_string(),
            value: "150".to_string(),
            usage_limit: "0".to_string(),
            ..CouponForm::default()
        };
        let errors = form.validate(CurrencyCode::VND).unwrap_err();
        assert!(errors.get("code").is_some());
        assert!(errors.get("value").is_some());
        assert!(errors.get("usageLimit").is_some());

        let form = CouponForm {
            code: " summer-10 ".to_string(),
            discount_type: "fixed".to_string(),
            value: "30000".to_string(),
            min_order_value: "100000".to_string(),
            ..CouponForm::default()
        };
        let payload = form.validate(CurrencyCode::VND).unwrap();
        assert_eq!(payload.code, "SUMMER-10");
        assert_eq!(payload.discount_type, DiscountType::Fixed);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["minOrderValue"], 100_000.0);
        assert!(json.get("maxDiscount").is_none());
    }

    #[test]
    fn test_form_errors_display() {
        let mut errors = FormErrors::new();
        errors.add("name", "không được để trống");
        errors.add("name", "ignored");
        errors.add("code", "sai");
        assert_eq!(errors.to_string(), "code: sai; name: không được để trống");
    }
}
