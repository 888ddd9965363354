//! Dashboard operations: CRUD for products, banners and coupons, order
//! management, and the live notification feed.
#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use clap::{Args, Subcommand};
use fastbite_admin::api::OrderFilter;
use fastbite_admin::components::{CrudResource, ListScreen};
use fastbite_admin::forms::{BannerForm, CouponForm, ProductForm, Upload};
use fastbite_admin::{Admin, AdminError};
use fastbite_core::{BannerId, CurrencyCode, OrderId, OrderStatus, ProductId, PromotionId};

use super::{CliError, CliResult, money};

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Manage the menu
    Products {
        #[command(subcommand)]
        action: Option<ProductAction>,
    },
    /// Manage banners
    Banners {
        #[command(subcommand)]
        action: Option<BannerAction>,
    },
    /// Manage coupon codes
    Coupons {
        #[command(subcommand)]
        action: Option<CouponAction>,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: Option<OrderAction>,
    },
    /// Print live shop events until Ctrl+C
    Watch,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Ids to delete (must be on the given page)
    #[arg(required = true)]
    pub ids: Vec<String>,
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Args)]
pub struct ProductArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub stock: Option<String>,
    /// Category id
    #[arg(long)]
    pub category: Option<String>,
    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,
    #[arg(long)]
    pub vegetarian: Option<bool>,
    #[arg(long)]
    pub featured: Option<bool>,
    #[arg(long)]
    pub active: Option<bool>,
    /// Image file to upload
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ProductAction {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(short, long)]
        search: Option<String>,
    },
    Create(ProductArgs),
    Update {
        id: String,
        #[command(flatten)]
        fields: ProductArgs,
    },
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct BannerArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub subtitle: Option<String>,
    /// Relative path or http(s) URL
    #[arg(long)]
    pub link: Option<String>,
    /// home_hero, home_middle, sidebar, popup or category_top
    #[arg(long)]
    pub position: Option<String>,
    /// image or text
    #[arg(long = "type")]
    pub banner_type: Option<String>,
    #[arg(long)]
    pub background_color: Option<String>,
    #[arg(long)]
    pub text_color: Option<String>,
    /// YYYY-MM-DD or RFC 3339
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub order: Option<String>,
    #[arg(long)]
    pub active: Option<bool>,
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum BannerAction {
    List(ListArgs),
    Create(BannerArgs),
    Update {
        id: String,
        #[command(flatten)]
        fields: BannerArgs,
    },
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct CouponArgs {
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// percentage or fixed
    #[arg(long = "type")]
    pub discount_type: Option<String>,
    #[arg(long)]
    pub value: Option<String>,
    #[arg(long)]
    pub min_order: Option<String>,
    #[arg(long)]
    pub max_discount: Option<String>,
    #[arg(long)]
    pub usage_limit: Option<String>,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Subcommand)]
pub enum CouponAction {
    List(ListArgs),
    Create(CouponArgs),
    Update {
        id: String,
        #[command(flatten)]
        fields: CouponArgs,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
pub enum OrderAction {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        status: Option<OrderStatus>,
        #[arg(short, long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    /// Move an order to a new status
    Status {
        id: String,
        status: OrderStatus,
    },
}

pub async fn run(admin: &Admin, command: AdminCommand) -> CliResult {
    match command {
        AdminCommand::Products { action } => products(admin, action).await,
        AdminCommand::Banners { action } => banners(admin, action).await,
        AdminCommand::Coupons { action } => coupons(admin, action).await,
        AdminCommand::Orders { action } => orders(admin, action).await,
        AdminCommand::Watch => watch(admin).await,
    }
}

fn set(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

async fn upload(path: Option<PathBuf>) -> Result<Option<Upload>, CliError> {
    match path {
        Some(path) => Upload::from_path(&path)
            .await
            .map(Some)
            .map_err(|e| CliError::Usage(format!("Không đọc được ảnh {}: {e}", path.display()))),
        None => Ok(None),
    }
}

async fn show_page<R: CrudResource>(
    screen: &mut ListScreen<R>,
    page: u32,
    render: impl Fn(&R::Item),
) -> CliResult {
    screen.go_to(page).await?;
    if screen.items().is_empty() {
        println!("Không có dữ liệu.");
    }
    for item in screen.items() {
        render(item);
    }
    if let Some(pagination) = screen.pagination() {
        println!(
            "\nTrang {}/{} · {} mục",
            pagination.page,
            pagination.total_pages.max(1),
            pagination.total
        );
    }
    Ok(())
}

async fn delete_selected<R>(mut screen: ListScreen<R>, args: DeleteArgs) -> CliResult
where
    R: CrudResource,
    R::Id: From<String>,
{
    screen.go_to(args.page).await?;
    for id in args.ids {
        if !screen.toggle_select(&R::Id::from(id.clone())) {
            println!("Bỏ qua {id}: không có trên trang {}", args.page);
        }
    }
    if screen.selected().is_empty() {
        return Err(CliError::Usage("Không có mục nào để xóa.".to_string()));
    }

    let report = screen.bulk_delete().await;
    let summary = report.summary();
    for id in &report.deleted {
        println!("Đã xóa {id}");
    }
    for (id, err) in report.failed {
        let message = AdminError::from(err).user_message();
        println!("Lỗi khi xóa {id}: {message}");
    }
    println!("{summary}");
    Ok(())
}

async fn products(admin: &Admin, action: Option<ProductAction>) -> CliResult {
    let action = action.unwrap_or(ProductAction::List {
        list: ListArgs { page: 1 },
        search: None,
    });
    match action {
        ProductAction::List { list, search } => {
            let mut screen = admin.products_screen(search.as_deref());
            show_page(&mut screen, list.page, |p| {
                println!(
                    "{:<26} {:<32} {:>12} kho:{:<4} {}",
                    p.id,
                    p.name,
                    money(p.price, CurrencyCode::VND),
                    p.stock,
                    if p.is_active { "" } else { "(ẩn)" }
                );
            })
            .await
        }
        ProductAction::Create(fields) => save_product(admin, None, fields).await,
        ProductAction::Update { id, fields } => {
            save_product(admin, Some(ProductId::new(id)), fields).await
        }
        ProductAction::Delete(args) => delete_selected(admin.products_screen(None), args).await,
    }
}

async fn save_product(admin: &Admin, id: Option<ProductId>, fields: ProductArgs) -> CliResult {
    let mut form = match &id {
        Some(id) => ProductForm::from_product(&admin.client().get_product(id).await?),
        None => ProductForm::default(),
    };
    set(&mut form.name, fields.name);
    set(&mut form.description, fields.description);
    set(&mut form.price, fields.price);
    set(&mut form.stock, fields.stock);
    set(&mut form.category_id, fields.category);
    set(&mut form.tags, fields.tags);
    form.is_vegetarian = fields.vegetarian.unwrap_or(form.is_vegetarian);
    form.is_featured = fields.featured.unwrap_or(form.is_featured);
    form.is_active = fields.active.unwrap_or(form.is_active);
    form.image = upload(fields.image).await?;

    let product = admin.save_product(id.as_ref(), &form).await?;
    println!("Đã lưu sản phẩm {} ({})", product.name, product.id);
    Ok(())
}

async fn banners(admin: &Admin, action: Option<BannerAction>) -> CliResult {
    match action.unwrap_or(BannerAction::List(ListArgs { page: 1 })) {
        BannerAction::List(list) => {
            let mut screen = admin.banners_screen();
            show_page(&mut screen, list.page, |b| {
                println!(
                    "{:<26} {:<14} {:<32} thứ tự:{} {}",
                    b.id,
                    b.position,
                    b.title,
                    b.display_order,
                    if b.is_active { "" } else { "(ẩn)" }
                );
            })
            .await
        }
        BannerAction::Create(fields) => save_banner(admin, None, fields).await,
        BannerAction::Update { id, fields } => {
            save_banner(admin, Some(BannerId::new(id)), fields).await
        }
        BannerAction::Delete(args) => delete_selected(admin.banners_screen(), args).await,
    }
}

async fn save_banner(admin: &Admin, id: Option<BannerId>, fields: BannerArgs) -> CliResult {
    let mut form = match &id {
        Some(id) => {
            let mut screen = admin.banners_screen();
            find_on_pages(&mut screen, id)
                .await?
                .map(|banner| BannerForm::from_banner(&banner))
                .ok_or_else(|| CliError::Usage(format!("Không tìm thấy banner {id}")))?
        }
        None => BannerForm::default(),
    };
    set(&mut form.title, fields.title);
    set(&mut form.subtitle, fields.subtitle);
    set(&mut form.link, fields.link);
    set(&mut form.position, fields.position);
    set(&mut form.banner_type, fields.banner_type);
    set(&mut form.background_color, fields.background_color);
    set(&mut form.text_color, fields.text_color);
    set(&mut form.start_date, fields.start);
    set(&mut form.end_date, fields.end);
    set(&mut form.display_order, fields.order);
    form.is_active = fields.active.unwrap_or(form.is_active);
    form.image = upload(fields.image).await?;

    let banner = admin.save_banner(id.as_ref(), &form).await?;
    println!("Đã lưu banner {} ({})", banner.title, banner.id);
    Ok(())
}

async fn coupons(admin: &Admin, action: Option<CouponAction>) -> CliResult {
    match action.unwrap_or(CouponAction::List(ListArgs { page: 1 })) {
        CouponAction::List(list) => {
            let mut screen = admin.coupons_screen();
            show_page(&mut screen, list.page, |c| {
                let used = c
                    .usage_limit
                    .map_or_else(|| c.used_count.to_string(), |l| format!("{}/{l}", c.used_count));
                println!(
                    "{:<26} {:<12} {:<14} đã dùng:{used} {}",
                    c.id,
                    c.code,
                    c.value_label(),
                    if c.is_active { "" } else { "(tắt)" }
                );
            })
            .await
        }
        CouponAction::Create(fields) => save_coupon(admin, None, fields).await,
        CouponAction::Update { id, fields } => {
            save_coupon(admin, Some(PromotionId::new(id)), fields).await
        }
        CouponAction::Delete(args) => delete_selected(admin.coupons_screen(), args).await,
    }
}

async fn save_coupon(admin: &Admin, id: Option<PromotionId>, fields: CouponArgs) -> CliResult {
    let mut form = match &id {
        Some(id) => {
            let mut screen = admin.coupons_screen();
            find_on_pages(&mut screen, id)
                .await?
                .map(|coupon| CouponForm::from_promotion(&coupon))
                .ok_or_else(|| CliError::Usage(format!("Không tìm thấy mã {id}")))?
        }
        None => CouponForm::default(),
    };
    set(&mut form.code, fields.code);
    set(&mut form.name, fields.name);
    set(&mut form.description, fields.description);
    set(&mut form.discount_type, fields.discount_type);
    set(&mut form.value, fields.value);
    set(&mut form.min_order_value, fields.min_order);
    set(&mut form.max_discount, fields.max_discount);
    set(&mut form.usage_limit, fields.usage_limit);
    set(&mut form.start_date, fields.start);
    set(&mut form.end_date, fields.end);
    form.is_active = fields.active.unwrap_or(form.is_active);

    let coupon = admin.save_coupon(id.as_ref(), &form).await?;
    println!("Đã lưu mã {} ({})", coupon.code, coupon.id);
    Ok(())
}

/// Walk the list pages until `id` shows up. Banners and coupons have no
/// single-item endpoint.
async fn find_on_pages<R: CrudResource>(
    screen: &mut ListScreen<R>,
    id: &R::Id,
) -> Result<Option<R::Item>, CliError> {
    let mut page = 1;
    loop {
        screen.go_to(page).await?;
        if let Some(item) = screen.items().iter().find(|item| R::id(item) == id) {
            return Ok(Some(item.clone()));
        }
        match screen.pagination() {
            Some(p) if p.page < p.total_pages => page += 1,
            _ => return Ok(None),
        }
    }
}

async fn orders(admin: &Admin, action: Option<OrderAction>) -> CliResult {
    let action = action.unwrap_or(OrderAction::List {
        list: ListArgs { page: 1 },
        status: None,
        search: None,
    });
    match action {
        OrderAction::List {
            list,
            status,
            search,
        } => {
            let filter = OrderFilter {
                page: Some(list.page),
                limit: Some(admin.config().page_size),
                status,
                search,
            };
            let orders = admin.client().list_orders(&filter).await?;
            if orders.items.is_empty() {
                println!("Không có đơn hàng nào.");
            }
            for order in &orders.items {
                println!(
                    "#{:<12} {:<16} {:<10} {:<8} {:>12}",
                    order.reference(),
                    order.status.label(),
                    order.payment_method,
                    order.payment_status,
                    money(order.total_amount, CurrencyCode::VND)
                );
            }
        }
        OrderAction::Show { id } => {
            let order = admin.client().get_order(&OrderId::new(id)).await?;
            println!("#{} · {}", order.reference(), order.status.label());
            if let Some(address) = &order.shipping_address {
                println!("{} · {} · {}", address.full_name, address.phone, address.address);
            }
            for item in &order.items {
                println!("  {} x{}", item.name, item.quantity);
            }
            println!("Tổng: {}", money(order.total_amount, CurrencyCode::VND));
        }
        OrderAction::Status { id, status } => {
            let order = admin
                .client()
                .update_order_status(&OrderId::new(id), status)
                .await?;
            println!("Đơn #{} → {}", order.reference(), order.status.label());
        }
    }
    Ok(())
}

async fn watch(admin: &Admin) -> CliResult {
    let mut handle = admin.notifications().spawn(64);
    println!("Đang lắng nghe sự kiện... (Ctrl+C để thoát)");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = handle.events.recv() => match event {
                Some(event) => println!("{}", event.toast()),
                None => break,
            },
            _ = &mut ctrl_c => break,
        }
    }

    handle.join().await.map_err(AdminError::from)?;
    Ok(())
}
