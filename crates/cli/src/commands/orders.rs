//! Checkout, payments and order history.
#![allow(clippy::print_stdout)]

use clap::{Args, Subcommand};
use fastbite_core::{Order, OrderId, PaymentMethod, ShippingAddress};
use fastbite_storefront::Storefront;
use fastbite_storefront::services::CheckoutForm;
use rust_decimal::Decimal;

use super::{CliResult, money};

#[derive(Args)]
pub struct CheckoutArgs {
    /// Recipient name
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub phone: String,

    /// Street address
    #[arg(long)]
    pub address: String,

    #[arg(long)]
    pub ward: Option<String>,

    #[arg(long)]
    pub district: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    /// cod, stripe, momo or vnpay
    #[arg(short, long, default_value = "cod")]
    pub method: PaymentMethod,

    #[arg(long)]
    pub coupon: Option<String>,

    /// Note for the kitchen
    #[arg(long)]
    pub note: Option<String>,

    /// Only show the totals
    #[arg(long)]
    pub quote: bool,
}

#[derive(Subcommand)]
pub enum OrdersAction {
    /// Recent orders (default)
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
    /// One order with its items
    Show { id: String },
    /// Cancel a pending order
    Cancel { id: String },
    /// Payment state of an order
    Payment { id: String },
}

pub async fn checkout(shop: &Storefront, args: CheckoutArgs) -> CliResult {
    let currency = shop.config().currency;
    if args.quote {
        let cart = shop.cart().load().await?;
        let quote = shop.checkout().quote(&cart, args.coupon.as_deref()).await?;
        println!("Tổng cộng: {}", money(quote.totals.total, currency));
        return Ok(());
    }

    let form = CheckoutForm {
        shipping_address: ShippingAddress {
            full_name: args.name,
            phone: args.phone,
            address: args.address,
            ward: args.ward,
            district: args.district,
            city: args.city,
        },
        payment_method: args.method,
        coupon_code: args.coupon,
        note: args.note,
    };

    let placed = shop.checkout().checkout(&form).await?;
    println!(
        "Đặt hàng thành công! Mã đơn #{} · {}",
        placed.order.reference(),
        money(placed.order.total_amount, currency)
    );
    match placed.redirect {
        Some(redirect) => println!("Thanh toán {} tại: {}", redirect.method, redirect.url),
        None => println!("Thanh toán khi nhận hàng."),
    }
    Ok(())
}

fn print_order_line(shop: &Storefront, order: &Order) {
    let created = order
        .created_at
        .map(|d| d.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "#{:<12} {:<16} {:<14} {:>12}  {created}",
        order.reference(),
        order.status.label(),
        order.payment_status,
        money(order.total_amount, shop.config().currency)
    );
}

pub async fn run(shop: &Storefront, action: OrdersAction) -> CliResult {
    let currency = shop.config().currency;
    match action {
        OrdersAction::List { page, limit } => {
            let orders = shop.checkout().my_orders(page, limit).await?;
            if orders.items.is_empty() {
                println!("Bạn chưa có đơn hàng nào.");
            }
            for order in &orders.items {
                print_order_line(shop, order);
            }
        }
        OrdersAction::Show { id } => {
            let order = shop.checkout().order(&OrderId::new(id)).await?;
            print_order_line(shop, &order);
            for (status, done) in order.status.progress_steps() {
                println!("  [{}] {}", if done { "x" } else { " " }, status.label());
            }
            for item in &order.items {
                println!(
                    "  {} x{} {}",
                    item.name,
                    item.quantity,
                    money(item.price * Decimal::from(item.quantity), currency)
                );
            }
        }
        OrdersAction::Cancel { id } => {
            let order = shop.checkout().cancel_order(&OrderId::new(id)).await?;
            println!("Đã hủy đơn #{}.", order.reference());
        }
        OrdersAction::Payment { id } => {
            let status = shop.checkout().payment_status(&OrderId::new(id)).await?;
            println!("Thanh toán: {}", status.payment_status);
            if let Some(order_status) = status.status {
                println!("Đơn hàng: {}", order_status.label());
            }
        }
    }
    Ok(())
}
