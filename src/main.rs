use std::error::Error;

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    harada::rocket().launch().await?;

    Ok(())
}
